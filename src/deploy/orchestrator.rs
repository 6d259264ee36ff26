// ABOUTME: Runs one workload through every deployment state.
// ABOUTME: Apply order is fixed: deployment, readiness wait, service, ingress.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::deployment::{DeployedService, Deployment};
use super::error::DeployFailure;
use super::target::DeployTarget;
use crate::cluster::ClusterOps;
use crate::manifest::{ManifestRenderer, ManifestStore};
use crate::ports::PortAllocator;

/// Collaborators shared by every deployment of one preview.
#[derive(Debug, Clone)]
pub struct DeployContext {
    pub renderer: ManifestRenderer,
    pub store: ManifestStore,
    pub ports: PortAllocator,
    pub readiness_timeout: Duration,
    pub conflict_retries: u32,
    /// Held from listing allocated node ports until the service is applied.
    /// Node ports are cluster-wide, so concurrent deployments take turns.
    pub port_lock: Arc<Mutex<()>>,
}

fn failed<S>((deployment, error): (Deployment<S>, super::DeployError)) -> DeployFailure {
    DeployFailure {
        workload: deployment.target().workload.clone(),
        applied: deployment.applied().to_vec(),
        error,
    }
}

/// Deploy one workload.
///
/// Readiness problems are recorded on the result. Render, apply and port
/// failures abort with the objects applied so far.
pub async fn deploy<C: ClusterOps + ?Sized>(
    cluster: &C,
    ctx: &DeployContext,
    target: DeployTarget,
) -> Result<DeployedService, DeployFailure> {
    tracing::info!(
        namespace = %target.namespace,
        workload = %target.workload,
        image = %target.image,
        "deploying"
    );

    let awaiting = Deployment::new(target)
        .render(&ctx.renderer, &ctx.store)
        .map_err(failed)?
        .apply_deployment(cluster)
        .await
        .map_err(failed)?
        .await_readiness(cluster, ctx.readiness_timeout)
        .await;

    let servicing = {
        let _ports = ctx.port_lock.lock().await;
        awaiting
            .apply_service(
                cluster,
                &ctx.ports,
                &ctx.renderer,
                &ctx.store,
                ctx.conflict_retries,
            )
            .await
            .map_err(failed)?
    };

    let deployment = servicing
        .apply_ingress(cluster, &ctx.renderer, &ctx.store)
        .await
        .map_err(failed)?;

    Ok(deployment.finish())
}
