// ABOUTME: Rendered manifest documents and the placeholder values fed to templates.
// ABOUTME: TemplateSet names the deployment/service/ingress templates for one workload.

use std::collections::BTreeMap;

use crate::types::{NamespaceName, PrNumber};

/// Placeholder values for one render, scoped to a namespace.
///
/// `namespace` and `pr_number` are always present as placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    namespace: NamespaceName,
    values: BTreeMap<String, String>,
}

impl Placeholders {
    pub fn new(namespace: &NamespaceName) -> Self {
        let mut values = BTreeMap::new();
        values.insert("namespace".to_string(), namespace.to_string());
        values.insert(
            "pr_number".to_string(),
            namespace.pr_number().get().to_string(),
        );
        Self {
            namespace: namespace.clone(),
            values,
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn namespace(&self) -> &NamespaceName {
        &self.namespace
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

/// A rendered manifest, keyed by template, namespace and PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDocument {
    pub template_id: String,
    pub namespace: NamespaceName,
    pub pr_number: PrNumber,
    pub content: String,
}

/// Template ids for the three objects of one workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub deployment: String,
    pub service: String,
    pub ingress: String,
}

impl TemplateSet {
    /// `deployment.yaml`, `service.yaml`, `ingress.yaml`, optionally prefixed
    /// (`frontend-deployment.yaml`).
    pub fn with_prefix(prefix: Option<&str>) -> Self {
        let name = |object: &str| match prefix {
            Some(prefix) => format!("{prefix}-{object}.yaml"),
            None => format!("{object}.yaml"),
        };
        Self {
            deployment: name("deployment"),
            service: name("service"),
            ingress: name("ingress"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_always_carry_namespace_and_pr() {
        let ns = NamespaceName::parse("pr-12-3").unwrap();
        let data = Placeholders::new(&ns).with("image", "reg/app:pr-12");
        assert_eq!(data.get("namespace"), Some("pr-12-3"));
        assert_eq!(data.get("pr_number"), Some("12"));
        assert_eq!(data.get("image"), Some("reg/app:pr-12"));
    }

    #[test]
    fn template_set_prefixes() {
        let generic = TemplateSet::with_prefix(None);
        assert_eq!(generic.service, "service.yaml");

        let frontend = TemplateSet::with_prefix(Some("frontend"));
        assert_eq!(frontend.deployment, "frontend-deployment.yaml");
        assert_eq!(frontend.ingress, "frontend-ingress.yaml");
    }
}
