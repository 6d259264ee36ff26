// ABOUTME: PreviewEngine, the composition root for creating and deleting previews.
// ABOUTME: Generic over the cluster, image, tunnel, process and source backends.

use futures::future::join_all;
use snafu::ResultExt;

use super::environment::PreviewEnvironment;
use super::error::{
    ClassificationSnafu, DeploySnafu, NamespaceAllocationSnafu, PortExhaustedSnafu, PreviewError,
    SnapshotUnavailableSnafu,
};
use super::result::{PreviewResources, PreviewResult};
use crate::build::{self, BuildPlan, BuildStrategy, DockerCli, ImageOps, PlanNaming};
use crate::cluster::{ClusterOps, Kubectl};
use crate::config::{Config, ExistingPreviewPolicy};
use crate::deploy::{self, DeployContext, DeployFailure, DeployTarget, DeployedService, Readiness};
use crate::diagnostics::{Diagnostics, Warning};
use crate::manifest::{ManifestRenderer, ManifestStore};
use crate::namespace::NamespaceAllocator;
use crate::ports::{LocalPortCounter, PortAllocator, ServiceKind};
use crate::probe::{CliTunnel, ProbeTarget, ReachabilityProbe, TunnelOps};
use crate::source::{GitCheckout, SourceControl};
use crate::teardown::{LsofProcesses, ProcessOps, TeardownCoordinator, TeardownReport};
use crate::types::{AppName, NamespaceName, PrNumber, RepoSlug};

/// The external systems a preview touches.
#[derive(Debug)]
pub struct Backends<C, I, T, P, S> {
    pub cluster: C,
    pub images: I,
    pub tunnel: T,
    pub processes: P,
    pub source: S,
}

/// Backends that drive the kubectl, docker, tunnel, lsof and git CLIs.
pub type CliBackends = Backends<Kubectl, DockerCli, CliTunnel, LsofProcesses, GitCheckout>;

impl CliBackends {
    pub fn from_config(config: &Config) -> Self {
        let tools = &config.tools;
        let timeouts = &config.timeouts;
        Backends {
            cluster: Kubectl::new(tools.kubectl.clone(), timeouts.command),
            images: DockerCli::new(
                tools.docker.clone(),
                tools.compose.clone(),
                timeouts.build,
                timeouts.command,
            ),
            tunnel: CliTunnel::new(
                tools.tunnel.clone(),
                tools.kubectl.clone(),
                &config.state_dir,
                timeouts.tunnel_settle,
                timeouts.forward,
            ),
            processes: LsofProcesses::new(tools.lsof.clone(), tools.kill.clone(), timeouts.command),
            source: GitCheckout::new(
                tools.git.clone(),
                &config.workspace_dir,
                timeouts.build,
                timeouts.command,
            ),
        }
    }
}

/// Creates and deletes preview environments.
#[derive(Debug)]
pub struct PreviewEngine<C, I, T, P, S> {
    backends: Backends<C, I, T, P, S>,
    registry_namespace: String,
    domain: String,
    existing_preview: ExistingPreviewPolicy,
    namespaces: NamespaceAllocator,
    deploy: DeployContext,
    probe: ReachabilityProbe,
    teardown: TeardownCoordinator,
    local_ports: LocalPortCounter,
}

impl<C, I, T, P, S> PreviewEngine<C, I, T, P, S>
where
    C: ClusterOps,
    I: ImageOps,
    T: TunnelOps,
    P: ProcessOps,
    S: SourceControl,
{
    pub fn new(config: &Config, backends: Backends<C, I, T, P, S>) -> Self {
        let ports = PortAllocator::new(config.ports.clone());
        Self {
            registry_namespace: config.registry_namespace.clone(),
            domain: config.domain.clone(),
            existing_preview: config.existing_preview,
            namespaces: NamespaceAllocator::new(config.namespace.max_attempts),
            deploy: DeployContext {
                renderer: ManifestRenderer::from_dir(&config.templates_dir),
                store: ManifestStore::new(&config.state_dir),
                ports: ports.clone(),
                readiness_timeout: config.timeouts.readiness,
                conflict_retries: config.ports.conflict_retries,
                port_lock: Default::default(),
            },
            probe: ReachabilityProbe::from_config(&config.probe, &config.timeouts),
            teardown: TeardownCoordinator::new(
                config.registry_namespace.clone(),
                &config.state_dir,
                ports,
            ),
            local_ports: LocalPortCounter::new(
                config.ports.forward_base,
                config.ports.forward_span,
            ),
            backends,
        }
    }

    /// Use a different template source, e.g. templates held in memory.
    pub fn with_renderer(mut self, renderer: ManifestRenderer) -> Self {
        self.deploy.renderer = renderer;
        self
    }

    pub fn backends(&self) -> &Backends<C, I, T, P, S> {
        &self.backends
    }

    /// Build and deploy the PR head of `repo_url` into a fresh namespace.
    ///
    /// Readiness and reachability problems are reported as warnings on a
    /// successful result. Errors say how far creation got in `stage()`.
    pub async fn create_preview(
        &self,
        repo_url: &str,
        credential: Option<&str>,
        pr: PrNumber,
    ) -> Result<PreviewResult, PreviewError> {
        let source = &self.backends.source;
        let snapshot = source
            .fetch_snapshot(repo_url, credential)
            .await
            .context(SnapshotUnavailableSnafu)?;
        source
            .checkout_pr(&snapshot.local_root, pr)
            .await
            .context(SnapshotUnavailableSnafu)?;
        tracing::info!(
            repository = %snapshot.repository,
            branch = %snapshot.default_branch,
            pr = %pr,
            "checked out pull request"
        );

        if self.existing_preview == ExistingPreviewPolicy::Replace {
            let report = self.delete_preview(pr).await;
            if !report.is_success() {
                tracing::warn!(pr = %pr, failures = report.failures.len(), "replacing preview left resources behind");
            }
        }

        let namespace = self
            .namespaces
            .allocate(&self.backends.cluster, pr)
            .await
            .context(NamespaceAllocationSnafu)?;

        let app_name = AppName::from_repository(&snapshot.repository);
        let mut environment = PreviewEnvironment::new(namespace.clone(), app_name, &self.domain);

        self.provision(&snapshot.repository, &snapshot.local_root, &mut environment)
            .await
            .inspect_err(|e| {
                environment.fail();
                tracing::error!(
                    namespace = %namespace,
                    kind = ?e.kind(),
                    status = ?environment.status,
                    error = %e,
                    "preview creation failed"
                );
            })
    }

    /// Build plans for a checkout, without touching any backend.
    pub fn plan(
        &self,
        root: &std::path::Path,
        repository: &RepoSlug,
        pr: PrNumber,
    ) -> Result<Vec<BuildPlan>, build::ClassifyError> {
        build::classify(root, &self.naming(repository, pr))
    }

    /// Reclaim every resource of every preview of `pr`.
    pub async fn delete_preview(&self, pr: PrNumber) -> TeardownReport {
        self.teardown
            .teardown(
                &self.backends.cluster,
                &self.backends.images,
                &self.backends.processes,
                pr,
            )
            .await
    }

    fn naming(&self, repository: &RepoSlug, pr: PrNumber) -> PlanNaming {
        PlanNaming {
            registry_namespace: self.registry_namespace.clone(),
            repository: repository.clone(),
            pr,
        }
    }

    async fn provision(
        &self,
        repository: &RepoSlug,
        root: &std::path::Path,
        environment: &mut PreviewEnvironment,
    ) -> Result<PreviewResult, PreviewError> {
        let namespace = environment.namespace.clone();
        let plans = build::classify(root, &self.naming(repository, environment.pr_number))
            .context(ClassificationSnafu {
                namespace: namespace.clone(),
            })?;
        tracing::info!(namespace = %namespace, plans = plans.len(), "classified repository");

        let mut targets = Vec::with_capacity(plans.len());
        for plan in &plans {
            let image = build::build_image(&self.backends.images, plan)
                .await
                .map_err(|source| {
                    let workload = plan.strategy.workload_name(&environment.app_name);
                    if source.is_build_failure() {
                        PreviewError::BuildFailed {
                            namespace: namespace.clone(),
                            workload,
                            source,
                        }
                    } else {
                        PreviewError::PublishFailed {
                            namespace: namespace.clone(),
                            workload,
                            source,
                        }
                    }
                })?;
            environment.image_refs.push(image.clone());

            let hostname = if plans.len() == 1 || plan.strategy == BuildStrategy::Generic {
                environment.hostname.clone()
            } else {
                environment.hostname_for(plan.strategy.image_suffix())
            };
            targets.push(DeployTarget::new(
                namespace.clone(),
                environment.app_name.clone(),
                plan.strategy.clone(),
                image,
                hostname,
            ));
        }

        let services = self.deploy_all(&namespace, targets).await?;

        let Some(primary) = primary_service(&services) else {
            return Err(PreviewError::Classification {
                namespace,
                source: build::ClassifyError::NoPlans {
                    root: root.to_path_buf(),
                },
            });
        };
        environment.service_name = Some(primary.service_name.clone());

        let mut diagnostics = Diagnostics::default();
        for service in &services {
            match &service.readiness {
                Readiness::TimedOut => diagnostics.warn(Warning::readiness(format!(
                    "{} was not ready before the timeout",
                    service.workload
                ))),
                Readiness::Failed(message) => diagnostics.warn(Warning::readiness(format!(
                    "readiness check for {} failed: {message}",
                    service.workload
                ))),
                Readiness::Ready | Readiness::Pending => {}
            }
        }

        let target = ProbeTarget {
            namespace: namespace.clone(),
            service_name: primary.service_name.clone(),
        };
        let (probe, probe_diagnostics) = self
            .probe
            .probe(
                &self.backends.cluster,
                &self.backends.tunnel,
                &self.local_ports,
                &target,
            )
            .await;
        diagnostics.absorb(probe_diagnostics);

        let resources = PreviewResources {
            namespace: namespace.clone(),
            deployment: primary.workload.clone(),
            service: primary.service_name.clone(),
        };
        environment.activate();

        tracing::info!(
            namespace = %namespace,
            url = ?probe.url.as_ref().map(|u| u.as_str()),
            reachable = probe.reachable,
            warnings = diagnostics.warnings().len(),
            "preview active"
        );

        Ok(PreviewResult {
            status: environment.status,
            service_url: probe.url.clone(),
            reachable: probe.reachable,
            resources,
            environment: environment.clone(),
            services,
            probe,
            warnings: diagnostics.into_warnings(),
        })
    }

    /// Compose services deploy concurrently; other strategies one after another.
    async fn deploy_all(
        &self,
        namespace: &NamespaceName,
        targets: Vec<DeployTarget>,
    ) -> Result<Vec<DeployedService>, PreviewError> {
        let cluster = &self.backends.cluster;
        let concurrent = targets.iter().all(|t| t.strategy.is_compose());

        let results: Vec<Result<DeployedService, DeployFailure>> = if concurrent {
            join_all(
                targets
                    .into_iter()
                    .map(|target| deploy::deploy(cluster, &self.deploy, target)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(targets.len());
            for target in targets {
                let result = deploy::deploy(cluster, &self.deploy, target).await;
                let failed = result.is_err();
                results.push(result);
                if failed {
                    break;
                }
            }
            results
        };

        let mut services = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(service) => services.push(service),
                Err(e) if failure.is_none() => failure = Some(e),
                Err(e) => {
                    tracing::warn!(workload = %e.workload, error = %e, "additional deployment failure");
                }
            }
        }

        let Some(failure) = failure else {
            return Ok(services);
        };

        let applied: Vec<String> = services
            .iter()
            .flat_map(|s| s.applied.iter())
            .chain(failure.applied.iter())
            .map(ToString::to_string)
            .collect();
        if failure.error.is_port_exhausted() {
            Err(failure).context(PortExhaustedSnafu {
                namespace: namespace.clone(),
                applied,
            })
        } else {
            Err(failure).context(DeploySnafu {
                namespace: namespace.clone(),
                applied,
            })
        }
    }
}

/// The frontend when there is one, otherwise the first workload.
fn primary_service(services: &[DeployedService]) -> Option<&DeployedService> {
    services
        .iter()
        .find(|s| s.port.service_kind == ServiceKind::Frontend)
        .or_else(|| services.first())
}
