// ABOUTME: Service tunnel and local port-forward processes.
// ABOUTME: Spawned in the background and recorded in the state directory for teardown.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::config::ToolCommand;
use crate::process::{self, BackgroundProcess, CommandSpec, ProcessRunError};
use crate::state_files::ProcessRecord;
use crate::types::NamespaceName;

const FORWARD_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors from tunnel and forward processes.
#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error("tunnel did not start: {0}")]
    FailedToStart(String),

    #[error("port-forward to {service} did not become ready: {message}")]
    ForwardFailed { service: String, message: String },

    #[error(transparent)]
    Process(#[from] ProcessRunError),
}

/// Makes cluster services reachable from this machine.
#[async_trait]
pub trait TunnelOps: Send + Sync {
    /// Start the cluster-provided service tunnel for a namespace.
    async fn start_tunnel(&self, namespace: &NamespaceName) -> Result<(), TunnelError>;

    /// Forward `127.0.0.1:{local_port}` to the service's `remote_port`.
    async fn forward(
        &self,
        namespace: &NamespaceName,
        service: &str,
        local_port: u16,
        remote_port: u16,
    ) -> Result<(), TunnelError>;
}

/// Runs the configured tunnel command and `kubectl port-forward`.
#[derive(Debug, Clone)]
pub struct CliTunnel {
    tunnel: ToolCommand,
    kubectl: ToolCommand,
    state_dir: PathBuf,
    settle: Duration,
    forward_timeout: Duration,
}

impl CliTunnel {
    pub fn new(
        tunnel: ToolCommand,
        kubectl: ToolCommand,
        state_dir: impl Into<PathBuf>,
        settle: Duration,
        forward_timeout: Duration,
    ) -> Self {
        Self {
            tunnel,
            kubectl,
            state_dir: state_dir.into(),
            settle,
            forward_timeout,
        }
    }

    fn log_path(&self, namespace: &NamespaceName, role: &str) -> PathBuf {
        self.state_dir.join(format!("{namespace}-{role}.log"))
    }

    /// Record the process so teardown can stop it, then let it run on.
    fn keep(
        &self,
        child: BackgroundProcess,
        namespace: &NamespaceName,
        role: &str,
        local_port: Option<u16>,
    ) {
        let Some(pid) = child.detach() else {
            return;
        };
        let record = ProcessRecord::new(pid, role, local_port);
        if let Err(e) = record.write(&self.state_dir, namespace) {
            tracing::warn!(pid, role, error = %e, "failed to record background process");
        }
    }
}

/// Last non-empty line of a process log, for error messages.
fn log_tail(path: &std::path::Path) -> String {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|text| {
            text.lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(|line| line.trim().to_string())
        })
        .unwrap_or_else(|| "process exited".to_string())
}

#[async_trait]
impl TunnelOps for CliTunnel {
    async fn start_tunnel(&self, namespace: &NamespaceName) -> Result<(), TunnelError> {
        let log_path = self.log_path(namespace, "tunnel");
        let spec = CommandSpec::tool(&self.tunnel);
        let mut child = process::spawn_background(&spec, &log_path)?;

        tokio::time::sleep(self.settle).await;
        if !child.is_running() {
            return Err(TunnelError::FailedToStart(log_tail(&log_path)));
        }

        tracing::info!(namespace = %namespace, pid = ?child.pid(), "tunnel started");
        self.keep(child, namespace, "tunnel", None);
        Ok(())
    }

    async fn forward(
        &self,
        namespace: &NamespaceName,
        service: &str,
        local_port: u16,
        remote_port: u16,
    ) -> Result<(), TunnelError> {
        let role = format!("{service}-forward");
        let log_path = self.log_path(namespace, &role);
        let spec = CommandSpec::tool(&self.kubectl)
            .args(["port-forward", "-n", namespace.as_str(), "--address", "127.0.0.1"])
            .arg(format!("service/{service}"))
            .arg(format!("{local_port}:{remote_port}"));
        let mut child = process::spawn_background(&spec, &log_path)?;

        let addr = ("127.0.0.1", local_port);
        let deadline = tokio::time::Instant::now() + self.forward_timeout;
        loop {
            if !child.is_running() {
                return Err(TunnelError::ForwardFailed {
                    service: service.to_string(),
                    message: log_tail(&log_path),
                });
            }
            if TcpStream::connect(addr).await.is_ok() {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                child.kill().await;
                return Err(TunnelError::ForwardFailed {
                    service: service.to_string(),
                    message: format!("no listener on port {local_port} after {:?}", self.forward_timeout),
                });
            }
            tokio::time::sleep(FORWARD_POLL_INTERVAL).await;
        }

        tracing::info!(
            namespace = %namespace,
            service,
            local_port,
            remote_port,
            "port-forward established"
        );
        self.keep(child, namespace, &role, Some(local_port));
        Ok(())
    }
}
