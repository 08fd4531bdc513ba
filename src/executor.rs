use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::Context;

/// A fully resolved child-process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    /// Run `line` through the platform shell.
    pub fn shell(line: &str) -> Self {
        if cfg!(windows) {
            Self::new("cmd").arg("/C").arg(line)
        } else {
            Self::new("/bin/sh").arg("-c").arg(line)
        }
    }

    /// The command as an operator would type it.
    pub fn display_line(&self) -> String {
        match self.args.as_slice() {
            [flag, line] if flag == "-c" || flag == "/C" => line.clone(),
            args => {
                let mut parts = vec![self.program.clone()];
                parts.extend(args.iter().cloned());
                parts.join(" ")
            }
        }
    }

    /// The program that has to exist for the command to run: the first word
    /// after any leading `NAME=value` assignments. `None` when the line opens
    /// with a shell builtin or wrapper, since the program it ends up running is not
    /// known until the shell runs it.
    pub fn program_name(&self) -> Option<String> {
        let line = self.display_line();
        let word = line.split_whitespace().find(|word| !is_assignment(word))?;
        if INDIRECT_WORDS.contains(&word) {
            return None;
        }
        Some(word.to_string())
    }
}

const INDIRECT_WORDS: &[&str] = &[
    "cd", "export", "set", "unset", "source", ".", "eval", "exec", "env", "command", "(", "{",
    "!",
];

fn is_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Exit status plus whatever the child wrote, when its output was captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one command to completion.
///
/// Errors are reserved for commands that could not be started or waited on;
/// a non-zero exit is reported through [`CommandOutput::code`].
pub trait CommandRunner {
    fn run(&mut self, spec: &CommandSpec) -> anyhow::Result<CommandOutput>;
}

/// Blocking runner backed by `std::process`.
///
/// By default the child shares this process's terminal, so prompts, colour
/// and progress output reach the operator live and the captured fields of
/// [`CommandOutput`] stay empty.
#[derive(Debug, Default)]
pub struct ShellRunner {
    capture: bool,
}

impl ShellRunner {
    /// A runner that collects the child's stdout and stderr instead of
    /// passing them through.
    pub fn capturing() -> Self {
        Self { capture: true }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, spec: &CommandSpec) -> anyhow::Result<CommandOutput> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit());
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        tracing::debug!(command = %spec.display_line(), capture = self.capture, "spawning");
        let output = if self.capture {
            let output = command
                .output()
                .with_context(|| format!("running command: {}", spec.display_line()))?;
            CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
        } else {
            let status = command
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .with_context(|| format!("running command: {}", spec.display_line()))?;
            CommandOutput {
                code: status.code(),
                ..CommandOutput::default()
            }
        };
        tracing::debug!(code = ?output.code, "command finished");

        Ok(output)
    }
}
