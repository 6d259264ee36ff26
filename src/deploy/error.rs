// ABOUTME: Error types for deployment operations.
// ABOUTME: Render, write, apply and port failures, plus what was applied before failing.

use std::path::PathBuf;

use super::deployment::AppliedObject;
use crate::cluster::ClusterError;
use crate::manifest::RenderError;
use crate::ports::PortError;

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("failed to render manifest: {0}")]
    Render(#[from] RenderError),

    #[error("failed to write manifest {path:?}: {source}")]
    WriteManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to apply {object}: {source}")]
    Apply {
        object: String,
        #[source]
        source: ClusterError,
    },

    #[error("failed to allocate a node port: {0}")]
    Port(#[from] PortError),

    /// The service kept hitting allocated ports after every retry.
    #[error("node port {port} still conflicting after {retries} retries: {source}")]
    PortConflict {
        port: u16,
        retries: u32,
        #[source]
        source: ClusterError,
    },
}

impl DeployError {
    /// No usable node port could be found.
    pub fn is_port_exhausted(&self) -> bool {
        matches!(
            self,
            DeployError::Port(PortError::Exhausted { .. }) | DeployError::PortConflict { .. }
        )
    }
}

/// A failed deployment and the objects it had applied by then.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct DeployFailure {
    pub workload: String,
    pub applied: Vec<AppliedObject>,
    #[source]
    pub error: DeployError,
}
