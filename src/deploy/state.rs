// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: States that need data (the rendered manifest path) carry it themselves.

use std::path::PathBuf;

use crate::ports::PortAllocation;

/// Nothing rendered yet.
/// Available actions: `render()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Rendering;

/// Deployment manifest rendered and written.
/// Available actions: `apply_deployment()`
#[derive(Debug, Clone)]
pub struct Deploying {
    pub(crate) manifest: PathBuf,
}

impl Deploying {
    pub fn manifest(&self) -> &PathBuf {
        &self.manifest
    }
}

/// Deployment object applied.
/// Available actions: `await_readiness()`
#[derive(Debug, Clone, Copy, Default)]
pub struct AwaitingReadiness;

/// Readiness settled (or given up on).
/// Available actions: `apply_service()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ServicingPorts;

/// Service applied with a granted node port.
/// Available actions: `apply_ingress()`
#[derive(Debug, Clone)]
pub struct Ingressing {
    pub(crate) port: PortAllocation,
}

/// All objects applied.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Done {
    pub(crate) port: PortAllocation,
}
