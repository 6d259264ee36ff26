// ABOUTME: The preview environment record, written only by the engine.
// ABOUTME: Provisioning until every service is deployed, then Active or Failed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{AppName, ImageRef, NamespaceName, PrNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    Provisioning,
    Active,
    Failed,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewEnvironment {
    pub pr_number: PrNumber,
    pub namespace: NamespaceName,
    pub app_name: AppName,
    pub hostname: String,
    /// Service of the primary workload.
    pub service_name: Option<String>,
    pub image_refs: Vec<ImageRef>,
    pub status: PreviewStatus,
    pub created_at: DateTime<Utc>,
}

impl PreviewEnvironment {
    pub fn new(namespace: NamespaceName, app_name: AppName, domain: &str) -> Self {
        Self {
            pr_number: namespace.pr_number(),
            hostname: format!("{namespace}.{domain}"),
            namespace,
            app_name,
            service_name: None,
            image_refs: Vec::new(),
            status: PreviewStatus::Provisioning,
            created_at: Utc::now(),
        }
    }

    /// Provisioning -> Active. Only a provisioning environment moves.
    pub fn activate(&mut self) {
        if self.status == PreviewStatus::Provisioning {
            self.status = PreviewStatus::Active;
        }
    }

    /// Provisioning -> Failed. Only a provisioning environment moves.
    pub fn fail(&mut self) {
        if self.status == PreviewStatus::Provisioning {
            self.status = PreviewStatus::Failed;
        }
    }

    /// Hostname for one workload. The primary workload uses the environment's
    /// hostname; others get a label in front of it.
    pub fn hostname_for(&self, label: Option<&str>) -> String {
        match label {
            None => self.hostname.clone(),
            Some(label) => format!("{label}.{}", self.hostname),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_environment_is_provisioning() {
        let env = PreviewEnvironment::new(
            NamespaceName::parse("pr-8-1").unwrap(),
            AppName::new("shop").unwrap(),
            "preview.local",
        );
        assert_eq!(env.status, PreviewStatus::Provisioning);
        assert_eq!(env.pr_number.get(), 8);
        assert_eq!(env.hostname, "pr-8-1.preview.local");
        assert_eq!(env.hostname_for(Some("api")), "api.pr-8-1.preview.local");
    }

    #[test]
    fn provisioning_ends_active_or_failed() {
        let env = || {
            PreviewEnvironment::new(
                NamespaceName::parse("pr-8").unwrap(),
                AppName::new("shop").unwrap(),
                "preview.local",
            )
        };

        let mut failed = env();
        failed.fail();
        assert_eq!(failed.status, PreviewStatus::Failed);
        failed.activate();
        assert_eq!(failed.status, PreviewStatus::Failed);

        let mut active = env();
        active.activate();
        assert_eq!(active.status, PreviewStatus::Active);
        active.fail();
        assert_eq!(active.status, PreviewStatus::Active);
    }
}
