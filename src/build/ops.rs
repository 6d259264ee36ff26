// ABOUTME: Image operations capability trait.
// ABOUTME: Build, tag, push, list and remove images.

use std::path::Path;

use async_trait::async_trait;

use super::error::ImageError;
use crate::types::ImageRef;

/// Container build/publish backend.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Build an image from a single build file.
    async fn build_image(
        &self,
        context: &Path,
        dockerfile: Option<&Path>,
        tag: &ImageRef,
    ) -> Result<(), ImageError>;

    /// Build one service of a multi-service descriptor.
    async fn compose_build(&self, descriptor: &Path, service: &str) -> Result<(), ImageError>;

    /// Add `target` as another name for `source`.
    async fn tag_image(&self, source: &str, target: &ImageRef) -> Result<(), ImageError>;

    /// Push an image to its registry.
    async fn push_image(&self, image: &ImageRef) -> Result<(), ImageError>;

    /// Local images whose repository starts with `prefix`.
    async fn list_images(&self, prefix: &str) -> Result<Vec<ImageRef>, ImageError>;

    /// Remove a local image.
    async fn remove_image(&self, image: &ImageRef) -> Result<(), ImageError>;
}
