// ABOUTME: Namespace allocation for preview environments.
// ABOUTME: Tries `pr-{n}`, then `pr-{n}-1`, `pr-{n}-2`, ... until creation succeeds.

use crate::cluster::{ClusterError, NamespaceOps};
use crate::types::{NamespaceName, PrNumber};

/// Errors from namespace allocation.
#[derive(Debug, thiserror::Error)]
pub enum NamespaceError {
    #[error("no free namespace for PR {pr} after {attempts} attempts")]
    Exhausted { pr: PrNumber, attempts: u32 },

    #[error("failed to create namespace {namespace}: {source}")]
    Create {
        namespace: NamespaceName,
        #[source]
        source: ClusterError,
    },
}

/// Allocates an exclusive namespace per preview creation.
#[derive(Debug, Clone)]
pub struct NamespaceAllocator {
    max_attempts: u32,
}

impl NamespaceAllocator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Create a namespace for `pr`.
    ///
    /// A name clash moves on to the next suffix. Any other failure is fatal.
    pub async fn allocate<N: NamespaceOps + ?Sized>(
        &self,
        cluster: &N,
        pr: PrNumber,
    ) -> Result<NamespaceName, NamespaceError> {
        for suffix in 0..self.max_attempts {
            let candidate = NamespaceName::for_pr(pr, suffix);
            match cluster.create_namespace(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(ClusterError::AlreadyExists(_)) => {
                    tracing::debug!(namespace = %candidate, "namespace taken, trying next suffix");
                }
                Err(source) => {
                    return Err(NamespaceError::Create {
                        namespace: candidate,
                        source,
                    });
                }
            }
        }

        Err(NamespaceError::Exhausted {
            pr,
            attempts: self.max_attempts,
        })
    }
}

impl Default for NamespaceAllocator {
    fn default() -> Self {
        Self::new(100)
    }
}
