// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Deployment -> readiness -> service (with port-conflict retry) -> ingress.

mod deployment;
mod error;
mod orchestrator;
mod state;
mod target;
mod transitions;

pub use deployment::{AppliedObject, DeployedService, Deployment, Readiness};
pub use error::{DeployError, DeployFailure};
pub use orchestrator::{DeployContext, deploy};
pub use state::{AwaitingReadiness, Deploying, Done, Ingressing, Rendering, ServicingPorts};
pub use target::DeployTarget;
pub use transitions::TransitionResult;
