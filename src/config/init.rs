// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes an ephemera.yml with the defaults spelled out.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, registry_namespace: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();
    if let Some(ns) = registry_namespace {
        let ns = ns.trim().trim_end_matches('/');
        if ns.is_empty() {
            return Err(Error::InvalidConfig(
                "registry namespace cannot be empty".to_string(),
            ));
        }
        config.registry_namespace = ns.to_string();
    }

    std::fs::write(&config_path, generate_template_yaml(&config))?;
    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"registry_namespace: {}
domain: {}
workspace_dir: {}
templates_dir: {}
state_dir: {}

# stack: keep earlier previews of a PR alongside new ones (pr-N, pr-N-1, ...)
# replace: tear down a PR's previews before creating a new one
existing_preview: stack

# token:
#   env: GITHUB_TOKEN

# tools:
#   kubectl: kubectl
#   compose: docker compose
#   tunnel: minikube tunnel

# ports:
#   conflict_retries: 1

# timeouts:
#   readiness: 60s
#   http_probe: 5s

# probe:
#   strategies: [tunnel-forward, node-port-localhost, node-ip]
"#,
        config.registry_namespace,
        config.domain,
        config.workspace_dir.display(),
        config.templates_dir.display(),
        config.state_dir.display(),
    )
}
