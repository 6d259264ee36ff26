// ABOUTME: Configuration types and parsing for ephemera.yml.
// ABOUTME: Registry, directories, tool commands, port ranges, timeouts and probe order.

mod deserialize;
mod env_value;
mod init;
mod ports;
mod probe;
mod timeouts;
mod tools;

pub use env_value::EnvValue;
pub use init::init_config;
pub use ports::PortsConfig;
pub use probe::{ProbeConfig, StrategyKind};
pub use timeouts::TimeoutsConfig;
pub use tools::{ToolCommand, ToolsConfig};

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "ephemera.yml";
pub const CONFIG_FILENAME_ALT: &str = "ephemera.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".ephemera/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Registry namespace images are published under, e.g. `ghcr.io/acme`.
    #[serde(deserialize_with = "deserialize::registry_namespace")]
    pub registry_namespace: String,

    /// Ingress hostnames are `{namespace}.{domain}`.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Where repositories are cloned.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,

    /// Directory holding the manifest templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Rendered manifests, process logs and pid files.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default)]
    pub existing_preview: ExistingPreviewPolicy,

    /// Credential used when cloning private repositories.
    #[serde(default)]
    pub token: Option<EnvValue>,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub ports: PortsConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub namespace: NamespaceConfig,
}

/// What `create` does when the PR already has a live preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingPreviewPolicy {
    /// Allocate another suffixed namespace next to the existing ones.
    #[default]
    Stack,
    /// Tear down every existing preview of the PR first.
    Replace,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Upper bound on `pr-{n}-{k}` suffixes tried before giving up.
    pub max_attempts: u32,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self { max_attempts: 100 }
    }
}

fn default_domain() -> String {
    "preview.local".to_string()
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("repos")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".ephemera/state")
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    /// Load a config file. Relative directories are resolved against the
    /// file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        let base = path
            .parent()
            .map(|p| {
                if p.ends_with(".ephemera") {
                    p.parent().unwrap_or(p)
                } else {
                    p
                }
            })
            .unwrap_or_else(|| Path::new("."));
        Ok(config.relative_to(base))
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Anchor relative directories at `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        for dir in [
            &mut self.workspace_dir,
            &mut self.templates_dir,
            &mut self.state_dir,
        ] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        self
    }

    /// Resolve the clone credential, if one is configured.
    pub fn credential(&self) -> Result<Option<String>> {
        self.token.as_ref().map(EnvValue::resolve).transpose()
    }

    pub fn template() -> Self {
        Config {
            registry_namespace: "my-registry".to_string(),
            domain: default_domain(),
            workspace_dir: default_workspace_dir(),
            templates_dir: default_templates_dir(),
            state_dir: default_state_dir(),
            existing_preview: ExistingPreviewPolicy::default(),
            token: None,
            tools: ToolsConfig::default(),
            ports: PortsConfig::default(),
            timeouts: TimeoutsConfig::default(),
            probe: ProbeConfig::default(),
            namespace: NamespaceConfig::default(),
        }
    }
}
