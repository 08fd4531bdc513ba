use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{
    DEFAULT_BUCKET_BASE, DEFAULT_BUILD_COMMAND, DEFAULT_DIST_DIR, DEFAULT_MANIFEST,
    DEFAULT_PUBLISH_COMMAND, DEFAULT_PULL_COMMAND, ReleaseConfig,
};
use crate::executor::ShellRunner;
use crate::manifest::load_manifest;
use crate::planner::plan_release;
use crate::preflight::warn_missing_tools;
use crate::runner::ReleaseRunner;

#[derive(Debug, Parser)]
#[command(
    name = "release-runner",
    version,
    about = "Pull, build, publish and upload a package release"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: ReleaseOptions,

    /// Exit non-zero when any step failed
    #[arg(long, global = true)]
    strict: bool,

    /// Log every command and exit code
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the release (the default when no subcommand is given)
    Run,
    /// Print the commands a release would run without executing them
    Plan {
        /// Emit compact JSON instead of pretty output
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Debug, Args)]
struct ReleaseOptions {
    /// Path to the package manifest
    #[arg(long, global = true, env = "RELEASE_MANIFEST", default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,

    /// Command that updates the source checkout
    #[arg(long, global = true, env = "RELEASE_PULL_COMMAND", default_value = DEFAULT_PULL_COMMAND)]
    pull_command: String,

    /// Remote to pull from
    #[arg(long, global = true, env = "RELEASE_REMOTE")]
    remote: Option<String>,

    /// Command that builds the package
    #[arg(long, global = true, env = "RELEASE_BUILD_COMMAND", default_value = DEFAULT_BUILD_COMMAND)]
    build_command: String,

    /// Command that publishes the package to its registry
    #[arg(long, global = true, env = "RELEASE_PUBLISH_COMMAND", default_value = DEFAULT_PUBLISH_COMMAND)]
    publish_command: String,

    /// Local build output to upload
    #[arg(long, global = true, env = "RELEASE_DIST_DIR", default_value = DEFAULT_DIST_DIR)]
    dist_dir: PathBuf,

    /// Storage path that versioned uploads land under
    #[arg(long, global = true, env = "RELEASE_BUCKET_BASE", default_value = DEFAULT_BUCKET_BASE)]
    bucket_base: String,

    /// Credentials profile for the storage tool
    #[arg(long, global = true, env = "RELEASE_AWS_PROFILE")]
    aws_profile: Option<String>,

    /// Directory to run the release in
    #[arg(long, global = true, env = "RELEASE_WORKDIR")]
    workdir: Option<PathBuf>,
}

impl From<ReleaseOptions> for ReleaseConfig {
    fn from(options: ReleaseOptions) -> Self {
        ReleaseConfig {
            manifest_path: options.manifest,
            pull_command: options.pull_command,
            remote: options.remote,
            build_command: options.build_command,
            publish_command: options.publish_command,
            dist_dir: options.dist_dir,
            bucket_base: options.bucket_base,
            aws_profile: options.aws_profile,
            workdir: options.workdir,
        }
    }
}

/// Parse arguments, run the chosen command and return the process exit code.
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ReleaseConfig::from(cli.options);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            warn_missing_tools(&config);

            let stdout = std::io::stdout();
            let mut runner = ReleaseRunner::new(&config, ShellRunner::default(), stdout.lock());
            let report = runner.run().context("release aborted")?;

            if cli.strict && report.has_failures() {
                tracing::error!("one or more release steps failed");
                return Ok(1);
            }
        }
        Commands::Plan { raw } => {
            let manifest_path = config.resolved_manifest_path();
            let manifest = load_manifest(&manifest_path)
                .with_context(|| format!("loading manifest from {}", manifest_path.display()))?;
            let plan = plan_release(&config, &manifest)
                .with_context(|| format!("planning release from {}", manifest_path.display()))?;

            let mut stdout = std::io::stdout().lock();
            if raw {
                writeln!(stdout, "{}", serde_json::to_string(&plan)?)?;
            } else {
                writeln!(stdout, "{}", serde_json::to_string_pretty(&plan)?)?;
            }
        }
    }

    Ok(0)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
