// ABOUTME: Local process discovery and termination.
// ABOUTME: lsof finds listeners on a port; kill stops them.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ToolCommand;
use crate::process::{self, CommandSpec, ProcessRunError};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("process {0} is not running")]
    NotRunning(u32),

    #[error("{0}")]
    Command(String),

    #[error(transparent)]
    Process(#[from] ProcessRunError),
}

#[async_trait]
pub trait ProcessOps: Send + Sync {
    /// Processes listening on a local TCP port.
    async fn listening_pids(&self, port: u16) -> Result<Vec<u32>, ProcessError>;

    /// Ask a process to exit.
    async fn terminate(&self, pid: u32) -> Result<(), ProcessError>;
}

#[derive(Debug, Clone)]
pub struct LsofProcesses {
    lsof: ToolCommand,
    kill: ToolCommand,
    timeout: Duration,
}

impl LsofProcesses {
    pub fn new(lsof: ToolCommand, kill: ToolCommand, timeout: Duration) -> Self {
        Self {
            lsof,
            kill,
            timeout,
        }
    }
}

fn parse_pids(stdout: &str) -> Vec<u32> {
    let mut pids: Vec<u32> = stdout
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

#[async_trait]
impl ProcessOps for LsofProcesses {
    async fn listening_pids(&self, port: u16) -> Result<Vec<u32>, ProcessError> {
        let spec = CommandSpec::tool(&self.lsof)
            .args(["-t", "-i"])
            .arg(format!("TCP:{port}"))
            .arg("-sTCP:LISTEN");
        let output = process::run(&spec, self.timeout).await?;

        // lsof exits 1 when nothing matches
        match output.exit_code {
            Some(0) => Ok(parse_pids(&output.stdout)),
            Some(1) if output.stderr.trim().is_empty() => Ok(Vec::new()),
            _ => Err(ProcessError::Command(output.diagnostic().to_string())),
        }
    }

    async fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        let spec = CommandSpec::tool(&self.kill).arg(pid.to_string());
        let output = process::run(&spec, self.timeout).await?;
        if output.success() {
            return Ok(());
        }
        if output.diagnostic().contains("No such process") {
            return Err(ProcessError::NotRunning(pid));
        }
        Err(ProcessError::Command(output.diagnostic().to_string()))
    }
}
