use crate::error::{Result, SweepError};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// An external program invocation: executable, ordered arguments, and the file
/// its standard output is redirected to. Arguments are passed as-is, never
/// through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub stdout_path: PathBuf,
    /// Send stderr to the same file as stdout.
    pub merge_stderr: bool,
}

impl ExternalCommand {
    pub fn new<P: Into<PathBuf>, O: Into<PathBuf>>(program: P, stdout_path: O) -> Self {
        ExternalCommand {
            program: program.into(),
            args: Vec::new(),
            stdout_path: stdout_path.into(),
            merge_stderr: false,
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends `--name=value`.
    pub fn flag<V: ToString>(self, name: &str, value: V) -> Self {
        let arg = format!("--{}={}", name, value.to_string());
        self.arg(arg)
    }

    pub fn merge_stderr(mut self) -> Self {
        self.merge_stderr = true;
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Human-readable rendering for logs.
    pub fn display_line(&self) -> String {
        let mut line = self.program_name();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push_str(" > ");
        line.push_str(&self.stdout_path.display().to_string());
        if self.merge_stderr {
            line.push_str(" 2>&1");
        }
        line
    }
}

/// Runs external commands to completion.
pub trait ProcessRunner {
    /// Runs the command, blocking until it exits. A spawn failure or a
    /// non-successful exit status is an error.
    fn run(&mut self, command: &ExternalCommand) -> Result<()>;
}

/// Spawns real processes through `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, command: &ExternalCommand) -> Result<()> {
        let stdout = create_output(&command.stdout_path)?;
        let stderr = if command.merge_stderr {
            let clone = stdout
                .try_clone()
                .map_err(|e| SweepError::io(&command.stdout_path, e))?;
            Stdio::from(clone)
        } else {
            Stdio::inherit()
        };

        log::debug!("running {}", command.display_line());
        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(stderr)
            .status()
            .map_err(|e| SweepError::CommandSpawn {
                program: command.program_name(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(SweepError::CommandFailed {
                program: command.program_name(),
                status: status.to_string(),
                output: command.stdout_path.clone(),
            });
        }

        Ok(())
    }
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| SweepError::io(path, e))
}
