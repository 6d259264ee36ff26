// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Tracks applied objects, readiness and the granted port across transitions.

use std::fmt;

use serde::Serialize;

use super::state::{Done, Ingressing, Rendering};
use super::target::DeployTarget;
use crate::ports::PortAllocation;
use crate::types::ImageRef;

/// Outcome of the bounded readiness wait. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum Readiness {
    Pending,
    Ready,
    TimedOut,
    Failed(String),
}

/// A cluster object applied by a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum AppliedObject {
    Deployment(String),
    Service(String),
    Ingress(String),
}

impl fmt::Display for AppliedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedObject::Deployment(name) => write!(f, "deployment/{name}"),
            AppliedObject::Service(name) => write!(f, "service/{name}"),
            AppliedObject::Ingress(name) => write!(f, "ingress/{name}"),
        }
    }
}

/// A deployment in progress, parameterized by its current state.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) target: DeployTarget,
    pub(crate) applied: Vec<AppliedObject>,
    pub(crate) readiness: Readiness,
    pub(crate) state: S,
}

impl Deployment<Rendering> {
    pub fn new(target: DeployTarget) -> Self {
        Deployment {
            target,
            applied: Vec::new(),
            readiness: Readiness::Pending,
            state: Rendering,
        }
    }
}

impl<S> Deployment<S> {
    pub fn target(&self) -> &DeployTarget {
        &self.target
    }

    /// Objects applied so far, in apply order.
    pub fn applied(&self) -> &[AppliedObject] {
        &self.applied
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

/// A fully applied workload.
#[derive(Debug, Clone, Serialize)]
pub struct DeployedService {
    pub workload: String,
    pub service_name: String,
    pub image: ImageRef,
    pub hostname: String,
    pub port: PortAllocation,
    pub readiness: Readiness,
    pub applied: Vec<AppliedObject>,
}

impl Deployment<Ingressing> {
    /// Node port granted to the service.
    pub fn port(&self) -> &PortAllocation {
        &self.state.port
    }
}

impl Deployment<Done> {
    pub fn port(&self) -> &PortAllocation {
        &self.state.port
    }

    /// Finish the deployment.
    pub fn finish(self) -> DeployedService {
        DeployedService {
            service_name: self.target.service_name(),
            workload: self.target.workload,
            image: self.target.image,
            hostname: self.target.hostname,
            port: self.state.port,
            readiness: self.readiness,
            applied: self.applied,
        }
    }
}
