// ABOUTME: Composable capability traits for the cluster control plane.
// ABOUTME: NamespaceOps, ObjectOps, ServiceOps, NodeOps and the ClusterOps umbrella.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::error::ClusterError;
use crate::types::NamespaceName;

/// Namespace lifecycle.
#[async_trait]
pub trait NamespaceOps: Send + Sync {
    /// Create a namespace. Fails with `ClusterError::AlreadyExists` on a name clash.
    async fn create_namespace(&self, name: &NamespaceName) -> Result<(), ClusterError>;

    /// Names of every namespace in the cluster.
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError>;

    /// Delete a namespace and everything in it.
    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError>;
}

/// Declarative object management.
#[async_trait]
pub trait ObjectOps: Send + Sync {
    /// Apply a rendered manifest file.
    async fn apply_manifest(&self, path: &Path) -> Result<(), ClusterError>;

    /// Wait until a deployment's rollout completes.
    async fn wait_for_rollout(
        &self,
        namespace: &NamespaceName,
        deployment: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError>;
}

/// Ports exposed by one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePorts {
    pub port: u16,
    pub node_port: Option<u16>,
}

/// Service inspection.
#[async_trait]
pub trait ServiceOps: Send + Sync {
    /// Every node port currently allocated across all namespaces.
    async fn allocated_node_ports(&self) -> Result<BTreeSet<u16>, ClusterError>;

    /// Ports of the first port entry of a service.
    async fn service_ports(
        &self,
        namespace: &NamespaceName,
        service: &str,
    ) -> Result<ServicePorts, ClusterError>;
}

/// Node inspection.
#[async_trait]
pub trait NodeOps: Send + Sync {
    /// Internal address of the first node.
    async fn node_address(&self) -> Result<String, ClusterError>;
}

/// Everything the engine needs from the cluster.
pub trait ClusterOps: NamespaceOps + ObjectOps + ServiceOps + NodeOps {}

impl<T: NamespaceOps + ObjectOps + ServiceOps + NodeOps> ClusterOps for T {}
