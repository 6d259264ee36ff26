// ABOUTME: The preview lifecycle engine: create and delete per-PR environments.
// ABOUTME: Composes source checkout, namespace allocation, builds, deploys, probing and teardown.

mod engine;
mod environment;
mod error;
mod result;

pub use engine::{Backends, CliBackends, PreviewEngine};
pub use environment::{PreviewEnvironment, PreviewStatus};
pub use error::{FailureStage, PreviewError, PreviewErrorKind};
pub use result::{PreviewResources, PreviewResult};
