// ABOUTME: Deterministic node-port seeds per (PR, service kind, namespace suffix).
// ABOUTME: Resolution probes upward from the seed past ports the cluster already holds.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::cluster::{ClusterError, ServiceOps};
use crate::config::PortsConfig;
use crate::types::{NamespaceName, PrNumber};

/// Port range a service is allocated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Generic,
    Frontend,
    Backend,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [
        ServiceKind::Generic,
        ServiceKind::Frontend,
        ServiceKind::Backend,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::Generic => "generic",
            ServiceKind::Frontend => "frontend",
            ServiceKind::Backend => "backend",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A granted node port. Recomputed on every deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortAllocation {
    pub requested_port: u16,
    pub granted_port: u16,
    pub service_kind: ServiceKind,
    pub namespace: NamespaceName,
}

/// Errors from port resolution.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("no free node port in {start}..{end} ({attempts} candidates tried)")]
    Exhausted { start: u32, end: u32, attempts: u16 },

    #[error("failed to list allocated node ports: {0}")]
    Cluster(#[from] ClusterError),
}

#[derive(Debug, Clone)]
pub struct PortAllocator {
    config: PortsConfig,
}

impl PortAllocator {
    pub fn new(config: PortsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PortsConfig {
        &self.config
    }

    fn base(&self, kind: ServiceKind) -> u32 {
        u32::from(match kind {
            ServiceKind::Generic => self.config.generic_base,
            ServiceKind::Frontend => self.config.frontend_base,
            ServiceKind::Backend => self.config.backend_base,
        })
    }

    fn seed_for_suffix(&self, pr: PrNumber, kind: ServiceKind, suffix: u32) -> u32 {
        // pr mod 100 fits in u32 without loss
        let pr_offset = (pr.get() % 100) as u32 * u32::from(self.config.pr_stride);
        let suffix_offset = suffix.saturating_mul(u32::from(self.config.suffix_stride));
        self.base(kind)
            .saturating_add(pr_offset)
            .saturating_add(suffix_offset)
    }

    /// Starting point for a service's node port. Not a guarantee of availability.
    pub fn seed(&self, kind: ServiceKind, namespace: &NamespaceName) -> u32 {
        self.seed_for_suffix(namespace.pr_number(), kind, namespace.suffix())
    }

    /// First port at or above `start` that is not in `allocated`, within the
    /// probe window and the node-port range.
    pub fn pick_free(&self, start: u32, allocated: &BTreeSet<u16>) -> Result<u16, PortError> {
        let attempts = self.config.max_probe_attempts;
        let end = start.saturating_add(u32::from(attempts));
        let ceiling = u32::from(self.config.node_port_max);

        (start..end)
            .take_while(|candidate| *candidate <= ceiling)
            .filter_map(|candidate| u16::try_from(candidate).ok())
            .find(|candidate| !allocated.contains(candidate))
            .ok_or(PortError::Exhausted {
                start,
                end,
                attempts,
            })
    }

    /// Resolve a free node port starting from the deterministic seed.
    pub async fn resolve<S: ServiceOps + ?Sized>(
        &self,
        cluster: &S,
        kind: ServiceKind,
        namespace: &NamespaceName,
    ) -> Result<PortAllocation, PortError> {
        self.resolve_from(cluster, self.seed(kind, namespace), kind, namespace)
            .await
    }

    /// Resolve a free node port starting from an explicit port.
    pub async fn resolve_from<S: ServiceOps + ?Sized>(
        &self,
        cluster: &S,
        start: u32,
        kind: ServiceKind,
        namespace: &NamespaceName,
    ) -> Result<PortAllocation, PortError> {
        let allocated = cluster.allocated_node_ports().await?;
        let granted = self.pick_free(start, &allocated)?;

        if u32::from(granted) != start {
            tracing::debug!(
                namespace = %namespace,
                kind = %kind,
                requested = start,
                granted,
                "seed port taken, probed upward"
            );
        }

        Ok(PortAllocation {
            requested_port: u16::try_from(start).unwrap_or(u16::MAX),
            granted_port: granted,
            service_kind: kind,
            namespace: namespace.clone(),
        })
    }

    /// Every seed a PR could have been given, across kinds and namespace suffixes.
    pub fn deterministic_ports(&self, pr: PrNumber) -> BTreeSet<u16> {
        ServiceKind::ALL
            .into_iter()
            .flat_map(|kind| {
                (0..=self.config.max_suffix).map(move |suffix| self.seed_for_suffix(pr, kind, suffix))
            })
            .filter(|port| *port <= u32::from(self.config.node_port_max))
            .filter_map(|port| u16::try_from(port).ok())
            .collect()
    }
}
