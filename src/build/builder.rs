// ABOUTME: Turns a BuildPlan into a published image.
// ABOUTME: Compose builds are re-tagged from their generated name before pushing.

use super::error::ImageError;
use super::ops::ImageOps;
use super::plan::{BuildPlan, BuildSource};
use crate::types::ImageRef;

/// Build and publish the image for `plan`, returning the reference to deploy.
///
/// Failures are not retried.
pub async fn build_image<I: ImageOps + ?Sized>(
    images: &I,
    plan: &BuildPlan,
) -> Result<ImageRef, ImageError> {
    let target = &plan.image_ref;

    match &plan.source {
        BuildSource::Prebuilt { image } => {
            tracing::info!(image = %image, "using prebuilt image");
            return Ok(target.clone());
        }
        BuildSource::Dockerfile { path } => {
            tracing::info!(
                image = %target,
                context = %plan.build_context.display(),
                "building image"
            );
            images
                .build_image(&plan.build_context, path.as_deref(), target)
                .await?;
        }
        BuildSource::ComposeService {
            descriptor,
            service,
            generated_image,
        } => {
            tracing::info!(
                image = %target,
                service = %service,
                descriptor = %descriptor.display(),
                "building compose service"
            );
            images.compose_build(descriptor, service).await?;
            images.tag_image(generated_image, target).await?;
        }
    }

    images.push_image(target).await?;
    tracing::info!(image = %target, "image published");
    Ok(target.clone())
}
