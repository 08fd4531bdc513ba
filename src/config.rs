use std::path::PathBuf;

pub const DEFAULT_MANIFEST: &str = "./package.json";
pub const DEFAULT_PULL_COMMAND: &str = "git pull";
pub const DEFAULT_BUILD_COMMAND: &str = "npm run build";
pub const DEFAULT_PUBLISH_COMMAND: &str = "npm publish";
pub const DEFAULT_DIST_DIR: &str = "./dist";
pub const DEFAULT_BUCKET_BASE: &str = "s3://broadwayinc.dev/jslib/skapi";

/// Everything a release run needs, passed explicitly instead of read from
/// the process environment along the way.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    pub manifest_path: PathBuf,
    pub pull_command: String,
    /// Appended to the pull command when set.
    pub remote: Option<String>,
    pub build_command: String,
    pub publish_command: String,
    pub dist_dir: PathBuf,
    pub bucket_base: String,
    /// Named credentials profile handed to the storage tool.
    pub aws_profile: Option<String>,
    /// Directory the child processes run in; `None` keeps the current one.
    pub workdir: Option<PathBuf>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST),
            pull_command: DEFAULT_PULL_COMMAND.to_string(),
            remote: None,
            build_command: DEFAULT_BUILD_COMMAND.to_string(),
            publish_command: DEFAULT_PUBLISH_COMMAND.to_string(),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            bucket_base: DEFAULT_BUCKET_BASE.to_string(),
            aws_profile: None,
            workdir: None,
        }
    }
}

impl ReleaseConfig {
    /// Manifest location, resolved against the working directory when relative.
    pub fn resolved_manifest_path(&self) -> PathBuf {
        match &self.workdir {
            Some(dir) if self.manifest_path.is_relative() => dir.join(&self.manifest_path),
            _ => self.manifest_path.clone(),
        }
    }

    pub fn pull_line(&self) -> String {
        match self.remote.as_deref().map(str::trim) {
            Some(remote) if !remote.is_empty() => format!("{} {remote}", self.pull_command),
            _ => self.pull_command.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReleaseConfig;
    use std::path::{Path, PathBuf};

    #[test]
    fn pull_line_appends_remote() {
        let config = ReleaseConfig {
            remote: Some("upstream".to_string()),
            ..ReleaseConfig::default()
        };
        assert_eq!(config.pull_line(), "git pull upstream");
        assert_eq!(ReleaseConfig::default().pull_line(), "git pull");
    }

    #[test]
    fn blank_remote_is_ignored() {
        let config = ReleaseConfig {
            remote: Some("  ".to_string()),
            ..ReleaseConfig::default()
        };
        assert_eq!(config.pull_line(), "git pull");
    }

    #[test]
    fn relative_manifest_follows_workdir() {
        let config = ReleaseConfig {
            workdir: Some(PathBuf::from("/srv/app")),
            ..ReleaseConfig::default()
        };
        assert_eq!(
            config.resolved_manifest_path(),
            Path::new("/srv/app").join("./package.json")
        );

        let absolute = ReleaseConfig {
            manifest_path: PathBuf::from("/etc/package.json"),
            workdir: Some(PathBuf::from("/srv/app")),
            ..ReleaseConfig::default()
        };
        assert_eq!(
            absolute.resolved_manifest_path(),
            PathBuf::from("/etc/package.json")
        );
    }
}
