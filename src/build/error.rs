// ABOUTME: Errors from classification and image operations.
// ABOUTME: ImageError separates build failures from tag/push failures.

use std::path::PathBuf;

use super::compose::ComposeError;
use crate::process::ProcessRunError;

/// Errors from the container build/publish backend.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image build failed: {0}")]
    BuildFailed(String),

    #[error("image push failed: {0}")]
    PushFailed(String),

    #[error("image not found: {0}")]
    NotFound(String),

    #[error("image backend error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Process(#[from] ProcessRunError),
}

impl ImageError {
    /// True for failures that happened while building, as opposed to publishing.
    pub fn is_build_failure(&self) -> bool {
        matches!(self, ImageError::BuildFailed(_))
    }
}

/// Errors from classifying a checkout into build plans.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("invalid compose descriptor {path:?}: {source}")]
    Compose {
        path: PathBuf,
        #[source]
        source: ComposeError,
    },

    #[error("compose service {service} uses an invalid image reference: {image}")]
    InvalidImage { service: String, image: String },

    #[error("nothing to build in {root:?}")]
    NoPlans { root: PathBuf },
}
