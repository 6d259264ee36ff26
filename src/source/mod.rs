// ABOUTME: Source-control gateway: materialises a repository checkout at a PR head.
// ABOUTME: The engine only reads the resulting RepositorySnapshot.

mod git;

pub use git::GitCheckout;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::process::ProcessRunError;
use crate::types::{PrNumber, RepoSlug, RepoSlugError};

/// A local checkout of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySnapshot {
    pub repository: RepoSlug,
    pub default_branch: String,
    pub local_root: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("invalid repository url: {0}")]
    InvalidUrl(#[from] RepoSlugError),

    #[error("git {operation} failed: {message}")]
    Git { operation: String, message: String },

    #[error("failed to prepare workspace {path:?}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessRunError),
}

#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Clone `repo_url` unless a checkout already exists, and describe it.
    async fn fetch_snapshot(
        &self,
        repo_url: &str,
        credential: Option<&str>,
    ) -> Result<RepositorySnapshot, SourceError>;

    /// Switch the checkout to the PR's head, replacing any earlier checkout of it.
    async fn checkout_pr(&self, local_root: &Path, pr: PrNumber) -> Result<(), SourceError>;
}
