// ABOUTME: Cluster control-plane capabilities and their kubectl implementation.
// ABOUTME: Namespaces, manifest apply, rollout waits, service ports and node addresses.

mod error;
mod kubectl;
mod parse;
mod traits;

pub use error::ClusterError;
pub use kubectl::Kubectl;
pub use traits::{ClusterOps, NamespaceOps, NodeOps, ObjectOps, ServiceOps, ServicePorts};
