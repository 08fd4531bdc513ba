use std::fmt;

use serde::Serialize;

use crate::config::ReleaseConfig;
use crate::executor::CommandSpec;
use crate::manifest::{Manifest, ManifestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStep {
    Pull,
    Build,
    Publish,
    Upload,
}

impl ReleaseStep {
    pub const SEQUENCE: [ReleaseStep; 4] = [
        ReleaseStep::Pull,
        ReleaseStep::Build,
        ReleaseStep::Publish,
        ReleaseStep::Upload,
    ];

    /// Console line printed when the step exits non-zero.
    pub fn failure_notice(self) -> &'static str {
        match self {
            ReleaseStep::Pull => "==Failed to pull==",
            ReleaseStep::Build => "==Failed to build==",
            ReleaseStep::Publish => "==Failed to publish==",
            ReleaseStep::Upload => "==Failed to upload==",
        }
    }
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseStep::Pull => "pull",
            ReleaseStep::Build => "build",
            ReleaseStep::Publish => "publish",
            ReleaseStep::Upload => "upload",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize)]
pub struct ReleasePlan {
    pub version: String,
    pub destination: String,
    pub steps: Vec<PlannedStep>,
}

#[derive(Debug, Serialize)]
pub struct PlannedStep {
    pub step: ReleaseStep,
    pub command: String,
}

/// `<bucket-base>/<version>`, without doubling a trailing slash on the base.
pub fn upload_destination(bucket_base: &str, version: &str) -> String {
    format!("{}/{}", bucket_base.trim_end_matches('/'), version)
}

/// Commands for the steps that do not depend on the manifest.
pub fn source_step_command(config: &ReleaseConfig, step: ReleaseStep) -> Option<CommandSpec> {
    let spec = match step {
        ReleaseStep::Pull => CommandSpec::shell(&config.pull_line()),
        ReleaseStep::Build => CommandSpec::shell(&config.build_command),
        ReleaseStep::Publish => CommandSpec::shell(&config.publish_command),
        ReleaseStep::Upload => return None,
    };
    Some(spec.cwd(config.workdir.clone()))
}

/// The storage sync for `version`, uploaded objects readable by anyone.
pub fn upload_command(config: &ReleaseConfig, version: &str) -> CommandSpec {
    let mut spec = CommandSpec::new("aws")
        .arg("s3")
        .arg("sync")
        .arg(config.dist_dir.to_string_lossy())
        .arg(upload_destination(&config.bucket_base, version))
        .arg("--acl")
        .arg("public-read");
    if let Some(profile) = config.aws_profile.as_deref().filter(|p| !p.trim().is_empty()) {
        spec.env.push(("AWS_PROFILE".to_string(), profile.to_string()));
    }
    spec.cwd(config.workdir.clone())
}

pub fn plan_release(
    config: &ReleaseConfig,
    manifest: &Manifest,
) -> Result<ReleasePlan, ManifestError> {
    let version = manifest.version()?;
    let steps = ReleaseStep::SEQUENCE
        .iter()
        .map(|&step| {
            let spec = source_step_command(config, step)
                .unwrap_or_else(|| upload_command(config, version));
            PlannedStep {
                step,
                command: spec.display_line(),
            }
        })
        .collect();

    Ok(ReleasePlan {
        version: version.to_string(),
        destination: upload_destination(&config.bucket_base, version),
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::{ReleaseStep, plan_release, upload_command, upload_destination};
    use crate::config::ReleaseConfig;
    use crate::manifest::Manifest;

    fn manifest(json: serde_json::Value) -> Manifest {
        Manifest::from_value(json).expect("object manifest")
    }

    #[test]
    fn destination_is_base_slash_version() {
        assert_eq!(
            upload_destination("s3://broadwayinc.dev/jslib/skapi", "1.2.3"),
            "s3://broadwayinc.dev/jslib/skapi/1.2.3"
        );
        assert_eq!(upload_destination("s3://bucket/", "1.2.3"), "s3://bucket/1.2.3");
    }

    #[test]
    fn upload_command_syncs_dist_with_public_read() {
        let spec = upload_command(&ReleaseConfig::default(), "1.2.3");
        assert_eq!(
            spec.display_line(),
            "aws s3 sync ./dist s3://broadwayinc.dev/jslib/skapi/1.2.3 --acl public-read"
        );
    }

    #[test]
    fn upload_command_passes_profile() {
        let config = ReleaseConfig {
            aws_profile: Some("release".to_string()),
            ..ReleaseConfig::default()
        };
        let spec = upload_command(&config, "2.0.0");
        assert_eq!(spec.env, [("AWS_PROFILE".to_string(), "release".to_string())]);
        assert!(spec.display_line().ends_with("--acl public-read"));
    }

    #[test]
    fn plan_lists_steps_in_order() {
        let plan = plan_release(
            &ReleaseConfig::default(),
            &manifest(serde_json::json!({"version": "0.9.1"})),
        )
        .expect("plan should build");

        let steps: Vec<ReleaseStep> = plan.steps.iter().map(|s| s.step).collect();
        assert_eq!(steps, ReleaseStep::SEQUENCE);
        assert_eq!(plan.steps[0].command, "git pull");
        assert_eq!(plan.steps[1].command, "npm run build");
        assert_eq!(plan.steps[2].command, "npm publish");
        assert_eq!(plan.destination, "s3://broadwayinc.dev/jslib/skapi/0.9.1");
    }

    #[test]
    fn plan_requires_a_version() {
        let result = plan_release(
            &ReleaseConfig::default(),
            &manifest(serde_json::json!({"name": "demo"})),
        );
        assert!(result.is_err());
    }
}
