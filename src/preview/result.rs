// ABOUTME: What create_preview hands back to its caller.
// ABOUTME: Degraded fields (reachability, readiness) are flagged, never hidden.

use serde::Serialize;
use url::Url;

use super::environment::{PreviewEnvironment, PreviewStatus};
use crate::deploy::DeployedService;
use crate::diagnostics::Warning;
use crate::probe::ProbeOutcome;
use crate::types::NamespaceName;

/// Cluster objects of the primary workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewResources {
    pub namespace: NamespaceName,
    pub deployment: String,
    pub service: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResult {
    pub status: PreviewStatus,
    pub service_url: Option<Url>,
    pub reachable: bool,
    pub resources: PreviewResources,
    pub environment: PreviewEnvironment,
    pub services: Vec<DeployedService>,
    pub probe: ProbeOutcome,
    pub warnings: Vec<Warning>,
}

impl PreviewResult {
    /// True when something was recovered from along the way.
    pub fn is_degraded(&self) -> bool {
        !self.reachable || !self.warnings.is_empty()
    }
}
