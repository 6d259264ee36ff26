// ABOUTME: Error type shared by all cluster capability traits.
// ABOUTME: Distinguishes conflicts the engine recovers from and plain command failures.

use std::time::Duration;

use crate::process::ProcessRunError;

/// Errors from cluster operations.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The node port requested by a service is held by another service.
    /// `port` is the conflicting port when the cluster names it.
    #[error("node port already allocated: {message}")]
    PortAllocated { port: Option<u16>, message: String },

    #[error("timed out after {timeout:?}: {message}")]
    Timeout { timeout: Duration, message: String },

    #[error("cluster command failed: {0}")]
    Command(String),

    #[error("unexpected cluster output: {0}")]
    Parse(String),

    #[error(transparent)]
    Process(#[from] ProcessRunError),
}

impl ClusterError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists(_))
    }
}
