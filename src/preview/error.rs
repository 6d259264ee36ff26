// ABOUTME: Preview engine error types with SNAFU pattern.
// ABOUTME: Each variant says whether the cluster was touched and what to clean up.

use snafu::Snafu;

use crate::build::{ClassifyError, ImageError};
use crate::deploy::DeployFailure;
use crate::namespace::NamespaceError;
use crate::source::SourceError;
use crate::types::NamespaceName;

/// Terminal failure of `create_preview`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PreviewError {
    #[snafu(display("repository snapshot unavailable: {source}"))]
    SnapshotUnavailable { source: SourceError },

    #[snafu(display("namespace allocation failed: {source}"))]
    NamespaceAllocation { source: NamespaceError },

    #[snafu(display("could not classify repository in {namespace}: {source}"))]
    Classification {
        namespace: NamespaceName,
        source: ClassifyError,
    },

    #[snafu(display("image build failed for {workload}: {source}"))]
    BuildFailed {
        namespace: NamespaceName,
        workload: String,
        source: ImageError,
    },

    #[snafu(display("image publish failed for {workload}: {source}"))]
    PublishFailed {
        namespace: NamespaceName,
        workload: String,
        source: ImageError,
    },

    #[snafu(display("no free node port for {}: {source}", source.workload))]
    PortExhausted {
        namespace: NamespaceName,
        applied: Vec<String>,
        source: DeployFailure,
    },

    #[snafu(display("deploying {} failed: {source}", source.workload))]
    Deploy {
        namespace: NamespaceName,
        applied: Vec<String>,
        source: DeployFailure,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewErrorKind {
    SnapshotUnavailable,
    NamespaceAllocation,
    Classification,
    BuildFailed,
    PublishFailed,
    PortExhausted,
    Deploy,
}

/// How far creation got before failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureStage {
    /// Nothing was created in the cluster.
    BeforeClusterMutation,
    /// The namespace exists and `applied` objects were applied inside it.
    PartiallyApplied {
        namespace: NamespaceName,
        applied: Vec<String>,
    },
}

impl PreviewError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> PreviewErrorKind {
        match self {
            PreviewError::SnapshotUnavailable { .. } => PreviewErrorKind::SnapshotUnavailable,
            PreviewError::NamespaceAllocation { .. } => PreviewErrorKind::NamespaceAllocation,
            PreviewError::Classification { .. } => PreviewErrorKind::Classification,
            PreviewError::BuildFailed { .. } => PreviewErrorKind::BuildFailed,
            PreviewError::PublishFailed { .. } => PreviewErrorKind::PublishFailed,
            PreviewError::PortExhausted { .. } => PreviewErrorKind::PortExhausted,
            PreviewError::Deploy { .. } => PreviewErrorKind::Deploy,
        }
    }

    /// Cluster state left behind by the failure.
    pub fn stage(&self) -> FailureStage {
        match self {
            PreviewError::SnapshotUnavailable { .. } | PreviewError::NamespaceAllocation { .. } => {
                FailureStage::BeforeClusterMutation
            }
            PreviewError::Classification { namespace, .. }
            | PreviewError::BuildFailed { namespace, .. }
            | PreviewError::PublishFailed { namespace, .. } => FailureStage::PartiallyApplied {
                namespace: namespace.clone(),
                applied: Vec::new(),
            },
            PreviewError::PortExhausted {
                namespace, applied, ..
            }
            | PreviewError::Deploy {
                namespace, applied, ..
            } => FailureStage::PartiallyApplied {
                namespace: namespace.clone(),
                applied: applied.clone(),
            },
        }
    }

    /// Namespace left behind, if any.
    pub fn namespace(&self) -> Option<&NamespaceName> {
        match self {
            PreviewError::SnapshotUnavailable { .. } | PreviewError::NamespaceAllocation { .. } => {
                None
            }
            PreviewError::Classification { namespace, .. }
            | PreviewError::BuildFailed { namespace, .. }
            | PreviewError::PublishFailed { namespace, .. }
            | PreviewError::PortExhausted { namespace, .. }
            | PreviewError::Deploy { namespace, .. } => Some(namespace),
        }
    }
}
