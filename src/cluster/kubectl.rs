// ABOUTME: kubectl-backed implementation of the cluster capability traits.
// ABOUTME: Every call is a bounded child process; failures are classified from stderr.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::error::ClusterError;
use super::parse;
use super::traits::{NamespaceOps, NodeOps, ObjectOps, ServiceOps, ServicePorts};
use crate::config::ToolCommand;
use crate::process::{self, CommandOutput, CommandSpec};
use crate::types::NamespaceName;

/// Talks to the cluster through the kubectl CLI.
#[derive(Debug, Clone)]
pub struct Kubectl {
    tool: ToolCommand,
    timeout: Duration,
}

impl Kubectl {
    pub fn new(tool: ToolCommand, timeout: Duration) -> Self {
        Self { tool, timeout }
    }

    pub fn tool(&self) -> &ToolCommand {
        &self.tool
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::tool(&self.tool)
    }

    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, ClusterError> {
        self.run_bounded(spec, self.timeout).await
    }

    async fn run_bounded(
        &self,
        spec: CommandSpec,
        timeout: Duration,
    ) -> Result<CommandOutput, ClusterError> {
        let output = process::run(&spec, timeout).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(parse::classify_failure(output.diagnostic()))
        }
    }
}

#[async_trait]
impl NamespaceOps for Kubectl {
    async fn create_namespace(&self, name: &NamespaceName) -> Result<(), ClusterError> {
        self.run(self.command().args(["create", "namespace", name.as_str()]))
            .await?;
        tracing::info!(namespace = %name, "namespace created");
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let output = self
            .run(self.command().args(["get", "namespaces", "-o", "json"]))
            .await?;
        parse::namespace_names(&output.stdout)
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        self.run(self.command().args(["delete", "namespace", name, "--wait=false"]))
            .await?;
        tracing::info!(namespace = name, "namespace deleted");
        Ok(())
    }
}

#[async_trait]
impl ObjectOps for Kubectl {
    async fn apply_manifest(&self, path: &Path) -> Result<(), ClusterError> {
        let spec = self
            .command()
            .args(["apply", "-f"])
            .arg(path.to_string_lossy());
        self.run(spec).await?;
        tracing::debug!(manifest = %path.display(), "manifest applied");
        Ok(())
    }

    async fn wait_for_rollout(
        &self,
        namespace: &NamespaceName,
        deployment: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        let spec = self
            .command()
            .args(["rollout", "status"])
            .arg(format!("deployment/{deployment}"))
            .args(["-n", namespace.as_str()])
            .arg(format!("--timeout={}s", timeout.as_secs().max(1)));

        // kubectl enforces its own timeout; leave it room to report before we kill it.
        match self
            .run_bounded(spec, timeout + Duration::from_secs(5))
            .await
        {
            Err(ClusterError::Process(process::ProcessRunError::Timeout { command, .. })) => {
                Err(ClusterError::Timeout {
                    timeout,
                    message: command,
                })
            }
            Err(ClusterError::Command(message)) if message.contains("timed out") => {
                Err(ClusterError::Timeout { timeout, message })
            }
            other => other.map(|_| ()),
        }
    }
}

#[async_trait]
impl ServiceOps for Kubectl {
    async fn allocated_node_ports(&self) -> Result<BTreeSet<u16>, ClusterError> {
        let output = self
            .run(
                self.command()
                    .args(["get", "services", "--all-namespaces", "-o", "json"]),
            )
            .await?;
        parse::node_ports(&output.stdout)
    }

    async fn service_ports(
        &self,
        namespace: &NamespaceName,
        service: &str,
    ) -> Result<ServicePorts, ClusterError> {
        let output = self
            .run(self.command().args([
                "get",
                "service",
                service,
                "-n",
                namespace.as_str(),
                "-o",
                "json",
            ]))
            .await?;
        parse::service_ports(&output.stdout)
    }
}

#[async_trait]
impl NodeOps for Kubectl {
    async fn node_address(&self) -> Result<String, ClusterError> {
        let output = self
            .run(self.command().args(["get", "nodes", "-o", "json"]))
            .await?;
        parse::node_address(&output.stdout)
    }
}
