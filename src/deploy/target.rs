// ABOUTME: What one deployment puts into the cluster.
// ABOUTME: Object names, image, hostname, port range and template ids for a single workload.

use crate::build::BuildStrategy;
use crate::manifest::{Placeholders, TemplateSet};
use crate::ports::ServiceKind;
use crate::types::{AppName, ImageRef, NamespaceName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    pub namespace: NamespaceName,
    pub app_name: AppName,
    pub strategy: BuildStrategy,
    /// Deployment object name; service and ingress names derive from it.
    pub workload: String,
    pub image: ImageRef,
    pub hostname: String,
    pub service_kind: ServiceKind,
    pub templates: TemplateSet,
}

impl DeployTarget {
    pub fn new(
        namespace: NamespaceName,
        app_name: AppName,
        strategy: BuildStrategy,
        image: ImageRef,
        hostname: String,
    ) -> Self {
        Self {
            workload: strategy.workload_name(&app_name),
            service_kind: strategy.service_kind(),
            templates: strategy.templates(),
            namespace,
            app_name,
            strategy,
            image,
            hostname,
        }
    }

    pub fn deployment_name(&self) -> &str {
        &self.workload
    }

    pub fn service_name(&self) -> String {
        format!("{}-service", self.workload)
    }

    pub fn ingress_name(&self) -> String {
        format!("{}-ingress", self.workload)
    }

    /// Values shared by every template of this workload.
    pub fn placeholders(&self) -> Placeholders {
        Placeholders::new(&self.namespace)
            .with("app_name", &self.app_name)
            .with("workload", &self.workload)
            .with("image", &self.image)
            .with("hostname", &self.hostname)
            .with("service_name", self.service_name())
            .with("ingress_name", self.ingress_name())
    }
}
