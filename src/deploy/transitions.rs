// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::path::PathBuf;
use std::time::Duration;

use super::Deployment;
use super::deployment::{AppliedObject, Readiness};
use super::error::DeployError;
use super::state::{
    AwaitingReadiness, Deploying, Done, Ingressing, Rendering, ServicingPorts,
};
use crate::cluster::{ClusterError, ObjectOps, ServiceOps};
use crate::manifest::{ManifestRenderer, ManifestStore, Placeholders};
use crate::ports::PortAllocator;

/// Result type for transitions; failures hand back the deployment so callers
/// can see what was already applied.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Deployment<S> {
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            target: self.target,
            applied: self.applied,
            readiness: self.readiness,
            state,
        }
    }

    fn write_manifest(
        &self,
        renderer: &ManifestRenderer,
        store: &ManifestStore,
        template_id: &str,
        data: &Placeholders,
    ) -> Result<PathBuf, DeployError> {
        let document = renderer.render(template_id, data)?;
        store
            .write(&document, &self.target.workload)
            .map_err(|source| DeployError::WriteManifest {
                path: store.path_for(&document, &self.target.workload),
                source,
            })
    }
}

// =============================================================================
// Rendering -> Deploying
// =============================================================================

impl Deployment<Rendering> {
    /// Render the deployment manifest and write it for applying.
    #[must_use = "deployment state must be used"]
    pub fn render(
        self,
        renderer: &ManifestRenderer,
        store: &ManifestStore,
    ) -> TransitionResult<Deploying, Rendering> {
        let data = self.target.placeholders();
        match self.write_manifest(renderer, store, &self.target.templates.deployment, &data) {
            Ok(manifest) => Ok(self.transition(Deploying { manifest })),
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// Deploying -> AwaitingReadiness
// =============================================================================

impl Deployment<Deploying> {
    /// Apply the deployment object. Failure is fatal.
    #[must_use = "deployment state must be used"]
    pub async fn apply_deployment<C: ObjectOps + ?Sized>(
        mut self,
        cluster: &C,
    ) -> TransitionResult<AwaitingReadiness, Deploying> {
        let name = self.target.deployment_name().to_string();
        match cluster.apply_manifest(&self.state.manifest).await {
            Ok(()) => {
                tracing::info!(namespace = %self.target.namespace, deployment = %name, "deployment applied");
                self.applied.push(AppliedObject::Deployment(name));
                Ok(self.transition(AwaitingReadiness))
            }
            Err(source) => Err((
                self,
                DeployError::Apply {
                    object: format!("deployment/{name}"),
                    source,
                },
            )),
        }
    }
}

// =============================================================================
// AwaitingReadiness -> ServicingPorts
// =============================================================================

impl Deployment<AwaitingReadiness> {
    /// Wait (bounded) for the rollout. The outcome is recorded, never fatal.
    pub async fn await_readiness<C: ObjectOps + ?Sized>(
        mut self,
        cluster: &C,
        timeout: Duration,
    ) -> Deployment<ServicingPorts> {
        let namespace = &self.target.namespace;
        let deployment = self.target.deployment_name();

        self.readiness = match cluster
            .wait_for_rollout(namespace, deployment, timeout)
            .await
        {
            Ok(()) => {
                tracing::info!(namespace = %namespace, deployment, "deployment ready");
                Readiness::Ready
            }
            Err(ClusterError::Timeout { .. }) => {
                tracing::warn!(
                    namespace = %namespace,
                    deployment,
                    timeout_secs = timeout.as_secs(),
                    "deployment not ready before timeout, continuing"
                );
                Readiness::TimedOut
            }
            Err(e) => {
                tracing::warn!(
                    namespace = %namespace,
                    deployment,
                    error = %e,
                    "readiness check failed, continuing"
                );
                Readiness::Failed(e.to_string())
            }
        };

        self.transition(ServicingPorts)
    }
}

// =============================================================================
// ServicingPorts -> Ingressing
// =============================================================================

impl Deployment<ServicingPorts> {
    /// Resolve a node port, render and apply the service.
    ///
    /// When the cluster rejects the port as already allocated, a new port is
    /// resolved starting one above it, the manifest is re-rendered and applied
    /// again, up to `retries` times.
    #[must_use = "deployment state must be used"]
    pub async fn apply_service<C: ObjectOps + ServiceOps + ?Sized>(
        mut self,
        cluster: &C,
        ports: &PortAllocator,
        renderer: &ManifestRenderer,
        store: &ManifestStore,
        retries: u32,
    ) -> TransitionResult<Ingressing, ServicingPorts> {
        let kind = self.target.service_kind;
        let namespace = self.target.namespace.clone();
        let service = self.target.service_name();

        let mut allocation = match ports.resolve(cluster, kind, &namespace).await {
            Ok(allocation) => allocation,
            Err(e) => return Err((self, e.into())),
        };
        let mut attempt = 0;

        loop {
            let data = self
                .target
                .placeholders()
                .with("node_port", allocation.granted_port);
            let path =
                match self.write_manifest(renderer, store, &self.target.templates.service, &data) {
                    Ok(path) => path,
                    Err(e) => return Err((self, e)),
                };

            let port = allocation.granted_port;
            match cluster.apply_manifest(&path).await {
                Ok(()) => {
                    tracing::info!(
                        namespace = %namespace,
                        service = %service,
                        node_port = port,
                        "service applied"
                    );
                    self.applied.push(AppliedObject::Service(service));
                    return Ok(self.transition(Ingressing { port: allocation }));
                }
                Err(ClusterError::PortAllocated { port: reported, .. }) if attempt < retries => {
                    attempt += 1;
                    let failed = reported.unwrap_or(port).max(port);
                    tracing::warn!(
                        namespace = %namespace,
                        service = %service,
                        port = failed,
                        attempt,
                        "node port already allocated, reallocating"
                    );
                    allocation = match ports
                        .resolve_from(cluster, u32::from(failed) + 1, kind, &namespace)
                        .await
                    {
                        Ok(next) => next,
                        Err(e) => return Err((self, e.into())),
                    };
                }
                Err(source @ ClusterError::PortAllocated { .. }) => {
                    return Err((
                        self,
                        DeployError::PortConflict {
                            port,
                            retries,
                            source,
                        },
                    ));
                }
                Err(source) => {
                    return Err((
                        self,
                        DeployError::Apply {
                            object: format!("service/{service}"),
                            source,
                        },
                    ));
                }
            }
        }
    }
}

// =============================================================================
// Ingressing -> Done
// =============================================================================

impl Deployment<Ingressing> {
    /// Render and apply the ingress.
    #[must_use = "deployment state must be used"]
    pub async fn apply_ingress<C: ObjectOps + ?Sized>(
        mut self,
        cluster: &C,
        renderer: &ManifestRenderer,
        store: &ManifestStore,
    ) -> TransitionResult<Done, Ingressing> {
        let data = self
            .target
            .placeholders()
            .with("node_port", self.state.port.granted_port);
        let path = match self.write_manifest(renderer, store, &self.target.templates.ingress, &data)
        {
            Ok(path) => path,
            Err(e) => return Err((self, e)),
        };

        let name = self.target.ingress_name();
        if let Err(source) = cluster.apply_manifest(&path).await {
            return Err((
                self,
                DeployError::Apply {
                    object: format!("ingress/{name}"),
                    source,
                },
            ));
        }

        tracing::info!(namespace = %self.target.namespace, ingress = %name, host = %self.target.hostname, "ingress applied");
        self.applied.push(AppliedObject::Ingress(name));
        let port = self.state.port.clone();
        Ok(self.transition(Done { port }))
    }
}
