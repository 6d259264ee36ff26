// ABOUTME: Build-strategy selection and image build/publish.
// ABOUTME: Classifies a checkout into BuildPlans and turns each plan into a pushed image.

mod builder;
mod compose;
mod docker;
mod error;
mod ops;
mod plan;
mod selector;

pub use builder::build_image;
pub use compose::{ComposeError, ComposeFile, ComposeService, DESCRIPTOR_NAMES};
pub use docker::DockerCli;
pub use error::{ClassifyError, ImageError};
pub use ops::ImageOps;
pub use plan::{BuildPlan, BuildSource, BuildStrategy, PlanNaming};
pub use selector::classify;
