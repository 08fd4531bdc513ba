use std::path::Path;

use which::which_in;

use crate::config::ReleaseConfig;
use crate::planner::{ReleaseStep, source_step_command, upload_command};

#[derive(Debug, Clone)]
pub struct MissingTool {
    pub step: ReleaseStep,
    pub program: String,
}

/// Looks up each step's program on `PATH`, or relative to the working
/// directory for paths like `./build.sh`. Nothing here stops a run; a
/// missing tool just means its step will fail and print its notice.
pub fn missing_tools(config: &ReleaseConfig) -> Vec<MissingTool> {
    let mut missing = Vec::new();

    for step in ReleaseStep::SEQUENCE {
        // The version only changes an argument, not the program.
        let spec = source_step_command(config, step).unwrap_or_else(|| upload_command(config, ""));
        let Some(program) = spec.program_name() else {
            continue;
        };
        if !has_command(&program, config.workdir.as_deref()) {
            missing.push(MissingTool { step, program });
        }
    }

    missing
}

pub fn warn_missing_tools(config: &ReleaseConfig) {
    for tool in missing_tools(config) {
        tracing::warn!(
            step = %tool.step,
            program = %tool.program,
            "program not found on PATH"
        );
    }
}

fn has_command(program: &str, workdir: Option<&Path>) -> bool {
    let cwd = match workdir {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(_) => return false,
        },
    };
    which_in(program, std::env::var_os("PATH"), cwd).is_ok()
}

#[cfg(test)]
mod tests {
    use super::missing_tools;
    use crate::config::ReleaseConfig;
    use crate::planner::ReleaseStep;

    #[test]
    fn reports_unknown_build_program() {
        let config = ReleaseConfig {
            build_command: "no-such-builder-7731 --release".to_string(),
            ..ReleaseConfig::default()
        };

        let missing = missing_tools(&config);
        let build = missing
            .iter()
            .find(|tool| tool.step == ReleaseStep::Build)
            .expect("build program should be missing");
        assert_eq!(build.program, "no-such-builder-7731");
    }

    #[cfg(unix)]
    #[test]
    fn finds_programs_that_exist() {
        let config = ReleaseConfig {
            pull_command: "sh -c true".to_string(),
            build_command: "sh -c true".to_string(),
            publish_command: "sh -c true".to_string(),
            ..ReleaseConfig::default()
        };

        let missing = missing_tools(&config);
        assert!(missing.iter().all(|tool| tool.step == ReleaseStep::Upload));
    }

    #[test]
    fn builtins_and_assignments_are_not_reported() {
        let config = ReleaseConfig {
            build_command: "cd web && no-such-builder-7731".to_string(),
            publish_command: "NPM_TAG=next no-such-publisher-7731 publish".to_string(),
            ..ReleaseConfig::default()
        };

        let missing = missing_tools(&config);
        assert!(missing.iter().all(|tool| tool.step != ReleaseStep::Build));
        let publish = missing
            .iter()
            .find(|tool| tool.step == ReleaseStep::Publish)
            .expect("publish program should be missing");
        assert_eq!(publish.program, "no-such-publisher-7731");
    }

    #[cfg(unix)]
    #[test]
    fn relative_programs_resolve_against_workdir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir should be created");
        let script = dir.path().join("release-build.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = ReleaseConfig {
            build_command: "./release-build.sh".to_string(),
            workdir: Some(dir.path().to_path_buf()),
            ..ReleaseConfig::default()
        };
        assert!(
            missing_tools(&config)
                .iter()
                .all(|tool| tool.step != ReleaseStep::Build)
        );

        let elsewhere = ReleaseConfig {
            workdir: None,
            ..config
        };
        assert!(
            missing_tools(&elsewhere)
                .iter()
                .any(|tool| tool.step == ReleaseStep::Build)
        );
    }
}
