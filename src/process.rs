// ABOUTME: Local process execution for the kubectl, docker, git and tunnel CLIs.
// ABOUTME: Bounded command runs with captured output, plus detached background processes.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

use crate::config::ToolCommand;

/// Output from a completed command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stderr if present, otherwise stdout. CLIs disagree on where errors go.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Errors from spawning or waiting on a process.
#[derive(Debug, thiserror::Error)]
pub enum ProcessRunError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("failed to open log file {path:?}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
struct Arg {
    value: String,
    secret: bool,
}

/// A command line to run. Secret arguments are masked in `Display`.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<Arg>,
    cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Start from a configured tool, which may carry leading arguments
    /// (`docker compose`, `minikube tunnel`).
    pub fn tool(tool: &ToolCommand) -> Self {
        let mut spec = Self::new(tool.program());
        for arg in tool.leading_args() {
            spec = spec.arg(arg.as_str());
        }
        spec
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            secret: false,
        });
        self
    }

    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self = self.arg(value);
        }
        self
    }

    pub fn secret_arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            secret: true,
        });
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Plain argument values, for assertions and logging.
    pub fn arg_values(&self) -> Vec<&str> {
        self.args.iter().map(|a| a.value.as_str()).collect()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args.iter().map(|a| a.value.as_str()));
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null());
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.secret {
                write!(f, " ***")?;
            } else {
                write!(f, " {}", arg.value)?;
            }
        }
        Ok(())
    }
}

/// Run a command to completion, capturing its output.
///
/// The child is killed if the timeout expires.
pub async fn run(spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput, ProcessRunError> {
    tracing::debug!(command = %spec, "running command");

    let mut cmd = spec.command();
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| ProcessRunError::Spawn {
        command: spec.to_string(),
        source,
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ProcessRunError::Timeout {
            command: spec.to_string(),
            timeout,
        })?
        .map_err(|source| ProcessRunError::Spawn {
            command: spec.to_string(),
            source,
        })?;

    let result = CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !result.success() {
        tracing::debug!(
            command = %spec,
            exit_code = ?result.exit_code,
            stderr = %result.stderr.trim(),
            "command failed"
        );
    }

    Ok(result)
}

/// A process left running after this call returns.
#[derive(Debug)]
pub struct BackgroundProcess {
    child: Child,
    pid: Option<u32>,
    log_path: PathBuf,
}

impl BackgroundProcess {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// True while the process has not exited.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill the process now.
    pub async fn kill(mut self) {
        let _ = self.child.kill().await;
    }

    /// Release ownership without stopping the process.
    pub fn detach(self) -> Option<u32> {
        self.pid
    }
}

/// Spawn a long-running process with stdout and stderr appended to `log_path`.
///
/// The process outlives both the handle and this program; its output goes to a
/// file rather than a pipe so it does not die of a closed pipe once we exit.
pub fn spawn_background(
    spec: &CommandSpec,
    log_path: &Path,
) -> Result<BackgroundProcess, ProcessRunError> {
    tracing::debug!(command = %spec, log = %log_path.display(), "spawning background process");

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ProcessRunError::LogFile {
            path: log_path.to_path_buf(),
            source,
        })?;
    }
    let log_error = |source| ProcessRunError::LogFile {
        path: log_path.to_path_buf(),
        source,
    };
    let stdout = File::options()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(log_error)?;
    let stderr = stdout.try_clone().map_err(log_error)?;

    let mut cmd = spec.command();
    cmd.stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(false);

    let child = cmd.spawn().map_err(|source| ProcessRunError::Spawn {
        command: spec.to_string(),
        source,
    })?;
    let pid = child.id();

    Ok(BackgroundProcess {
        child,
        pid,
        log_path: log_path.to_path_buf(),
    })
}
