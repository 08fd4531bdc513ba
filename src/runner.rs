use std::io::{Stderr, Write};

use thiserror::Error;

use crate::config::ReleaseConfig;
use crate::executor::{CommandOutput, CommandRunner, CommandSpec};
use crate::manifest::{ManifestError, load_manifest};
use crate::planner::{ReleaseStep, source_step_command, upload_command};

pub const COMPLETION_NOTICE: &str = "==END==";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed { code: Option<i32> },
    Skipped,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub steps: Vec<(ReleaseStep, StepOutcome)>,
    pub version: Option<String>,
}

impl RunReport {
    pub fn outcome(&self, step: ReleaseStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|(_, outcome)| matches!(outcome, StepOutcome::Failed { .. }))
    }
}

/// Errors that end a run early. Step failures are not errors; they are
/// recorded in the [`RunReport`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("writing console output")]
    Console(#[from] std::io::Error),
}

/// Drives pull, build, publish and upload in order, printing a notice for
/// each failed step and a completion line at the end.
///
/// Notices go to `console`; any stderr a step's runner captured goes to
/// `errors`, never to `console`.
pub struct ReleaseRunner<'a, R, W, E = Stderr> {
    config: &'a ReleaseConfig,
    commands: R,
    console: W,
    errors: E,
}

impl<'a, R: CommandRunner, W: Write> ReleaseRunner<'a, R, W, Stderr> {
    pub fn new(config: &'a ReleaseConfig, commands: R, console: W) -> Self {
        Self {
            config,
            commands,
            console,
            errors: std::io::stderr(),
        }
    }
}

impl<'a, R: CommandRunner, W: Write, E: Write> ReleaseRunner<'a, R, W, E> {
    pub fn with_errors<E2: Write>(self, errors: E2) -> ReleaseRunner<'a, R, W, E2> {
        ReleaseRunner {
            config: self.config,
            commands: self.commands,
            console: self.console,
            errors,
        }
    }

    pub fn into_parts(self) -> (R, W, E) {
        (self.commands, self.console, self.errors)
    }

    pub fn run(&mut self) -> Result<RunReport, RunError> {
        let mut report = RunReport::default();

        for step in [ReleaseStep::Pull, ReleaseStep::Build] {
            let outcome = self.run_source_step(step)?;
            report.steps.push((step, outcome));
        }

        let manifest_path = self.config.resolved_manifest_path();
        tracing::debug!(path = %manifest_path.display(), "reading manifest");
        let manifest = load_manifest(&manifest_path)?;

        let published = self.run_source_step(ReleaseStep::Publish)?;
        let upload = if published == StepOutcome::Succeeded {
            let version = manifest.version()?;
            report.version = Some(version.to_string());
            let spec = upload_command(self.config, version);
            self.run_step(ReleaseStep::Upload, &spec)?
        } else {
            tracing::info!("publish did not succeed, skipping upload");
            StepOutcome::Skipped
        };
        report.steps.push((ReleaseStep::Publish, published));
        report.steps.push((ReleaseStep::Upload, upload));

        writeln!(self.console, "{COMPLETION_NOTICE}")?;
        Ok(report)
    }

    fn run_source_step(&mut self, step: ReleaseStep) -> Result<StepOutcome, RunError> {
        match source_step_command(self.config, step) {
            Some(spec) => self.run_step(step, &spec),
            None => Ok(StepOutcome::Skipped),
        }
    }

    fn run_step(
        &mut self,
        step: ReleaseStep,
        spec: &CommandSpec,
    ) -> Result<StepOutcome, RunError> {
        tracing::info!(%step, command = %spec.display_line(), "running step");

        let outcome = match self.commands.run(spec) {
            Ok(output) => {
                self.echo(&output)?;
                if output.success() {
                    StepOutcome::Succeeded
                } else {
                    StepOutcome::Failed { code: output.code }
                }
            }
            Err(err) => {
                tracing::warn!(%step, error = %format!("{err:#}"), "could not run step");
                StepOutcome::Failed { code: None }
            }
        };

        if let StepOutcome::Failed { code } = &outcome {
            tracing::debug!(%step, ?code, "step failed");
            writeln!(self.console, "{}", step.failure_notice())?;
        }

        Ok(outcome)
    }

    fn echo(&mut self, output: &CommandOutput) -> std::io::Result<()> {
        write_stream(&mut self.console, &output.stdout)?;
        write_stream(&mut self.errors, &output.stderr)
    }
}

fn write_stream(sink: &mut impl Write, text: &str) -> std::io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    sink.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        writeln!(sink)?;
    }
    Ok(())
}
