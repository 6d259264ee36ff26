// ABOUTME: BuildPlan, the unit of work for building and deploying one service.
// ABOUTME: Strategy decides port range, templates and the canonical image name.

use std::path::PathBuf;

use serde::Serialize;

use crate::manifest::TemplateSet;
use crate::ports::ServiceKind;
use crate::types::{AppName, ImageRef, PrNumber, RepoSlug};

/// How a buildable unit was recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BuildStrategy {
    Frontend,
    Backend,
    Generic,
    Compose { service: String },
}

impl BuildStrategy {
    /// Suffix in the canonical image name; `None` for generic builds.
    pub fn image_suffix(&self) -> Option<&str> {
        match self {
            BuildStrategy::Frontend => Some("frontend"),
            BuildStrategy::Backend => Some("backend"),
            BuildStrategy::Generic => None,
            BuildStrategy::Compose { service } => Some(service),
        }
    }

    pub fn service_kind(&self) -> ServiceKind {
        match self {
            BuildStrategy::Frontend => ServiceKind::Frontend,
            BuildStrategy::Backend => ServiceKind::Backend,
            BuildStrategy::Generic => ServiceKind::Generic,
            BuildStrategy::Compose { service } => match service.as_str() {
                "frontend" => ServiceKind::Frontend,
                "backend" => ServiceKind::Backend,
                _ => ServiceKind::Generic,
            },
        }
    }

    pub fn templates(&self) -> TemplateSet {
        match self {
            BuildStrategy::Frontend => TemplateSet::with_prefix(Some("frontend")),
            BuildStrategy::Backend => TemplateSet::with_prefix(Some("backend")),
            BuildStrategy::Generic | BuildStrategy::Compose { .. } => {
                TemplateSet::with_prefix(None)
            }
        }
    }

    /// Workload name inside the namespace: the app name, suffixed for
    /// anything but a generic build.
    pub fn workload_name(&self, app: &AppName) -> String {
        match self.image_suffix() {
            None => app.to_string(),
            Some(suffix) => format!("{app}-{}", sanitize_label(suffix)),
        }
    }

    pub fn is_compose(&self) -> bool {
        matches!(self, BuildStrategy::Compose { .. })
    }
}

fn sanitize_label(value: &str) -> String {
    let mapped: String = value
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    mapped.trim_matches('-').to_string()
}

/// Where the image for a plan comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildSource {
    /// Build file in the context. `path` is set when it must be passed explicitly.
    Dockerfile { path: Option<PathBuf> },
    /// A service of a multi-service descriptor, and the image name it produces.
    ComposeService {
        descriptor: PathBuf,
        service: String,
        generated_image: String,
    },
    /// Nothing to build; the service runs an upstream image.
    Prebuilt { image: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub strategy: BuildStrategy,
    pub build_context: PathBuf,
    pub image_ref: ImageRef,
    pub source: BuildSource,
}

/// Inputs for canonical image references.
#[derive(Debug, Clone)]
pub struct PlanNaming {
    pub registry_namespace: String,
    pub repository: RepoSlug,
    pub pr: PrNumber,
}

impl PlanNaming {
    pub fn image_for(&self, strategy: &BuildStrategy) -> ImageRef {
        let suffix = strategy.image_suffix().map(sanitize_label);
        ImageRef::preview(
            &self.registry_namespace,
            &self.repository,
            suffix.as_deref(),
            self.pr,
        )
    }
}
