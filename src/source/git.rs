// ABOUTME: git CLI implementation of SourceControl.
// ABOUTME: Clones into `{workspace}/{owner}-{name}` and fetches `pull/{n}/head`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{RepositorySnapshot, SourceControl, SourceError};
use crate::config::ToolCommand;
use crate::process::{self, CommandOutput, CommandSpec};
use crate::types::{PrNumber, RepoSlug};

#[derive(Debug, Clone)]
pub struct GitCheckout {
    git: ToolCommand,
    workspace: PathBuf,
    clone_timeout: Duration,
    command_timeout: Duration,
}

impl GitCheckout {
    pub fn new(
        git: ToolCommand,
        workspace: impl Into<PathBuf>,
        clone_timeout: Duration,
        command_timeout: Duration,
    ) -> Self {
        Self {
            git,
            workspace: workspace.into(),
            clone_timeout,
            command_timeout,
        }
    }

    async fn git(
        &self,
        operation: &str,
        spec: CommandSpec,
        timeout: Duration,
    ) -> Result<CommandOutput, SourceError> {
        let output = process::run(&spec, timeout).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(SourceError::Git {
                operation: operation.to_string(),
                message: output.diagnostic().to_string(),
            })
        }
    }

    async fn default_branch(&self, root: &Path) -> String {
        let spec = CommandSpec::tool(&self.git)
            .current_dir(root)
            .args(["symbolic-ref", "--short", "refs/remotes/origin/HEAD"]);
        match self.git("symbolic-ref", spec, self.command_timeout).await {
            Ok(output) => parse_default_branch(&output.stdout),
            Err(e) => {
                tracing::debug!(error = %e, "origin/HEAD not set, assuming main");
                "main".to_string()
            }
        }
    }
}

/// Strip the remote from `origin/main`.
fn parse_default_branch(symbolic_ref: &str) -> String {
    let trimmed = symbolic_ref.trim();
    let branch = trimmed.strip_prefix("origin/").unwrap_or(trimmed);
    if branch.is_empty() {
        "main".to_string()
    } else {
        branch.to_string()
    }
}

/// Inject the credential into an https clone URL. Other URLs pass through.
fn authenticated_url(repo_url: &str, credential: Option<&str>) -> String {
    let Some(token) = credential.filter(|t| !t.is_empty()) else {
        return repo_url.to_string();
    };
    match Url::parse(repo_url) {
        Ok(mut url) if url.scheme() == "https" => {
            if url.set_username("x-access-token").is_ok() && url.set_password(Some(token)).is_ok()
            {
                url.to_string()
            } else {
                repo_url.to_string()
            }
        }
        _ => repo_url.to_string(),
    }
}

#[async_trait]
impl SourceControl for GitCheckout {
    async fn fetch_snapshot(
        &self,
        repo_url: &str,
        credential: Option<&str>,
    ) -> Result<RepositorySnapshot, SourceError> {
        let repository = RepoSlug::from_url(repo_url)?;
        let local_root = self.workspace.join(repository.flattened());

        if local_root.join(".git").is_dir() {
            tracing::info!(path = %local_root.display(), "reusing existing checkout");
        } else {
            std::fs::create_dir_all(&self.workspace).map_err(|source| {
                SourceError::Workspace {
                    path: self.workspace.clone(),
                    source,
                }
            })?;
            tracing::info!(repository = %repository, "cloning repository");
            let spec = CommandSpec::tool(&self.git)
                .arg("clone")
                .secret_arg(authenticated_url(repo_url, credential))
                .arg(local_root.to_string_lossy());
            self.git("clone", spec, self.clone_timeout).await?;
        }

        let default_branch = self.default_branch(&local_root).await;
        Ok(RepositorySnapshot {
            repository,
            default_branch,
            local_root,
        })
    }

    async fn checkout_pr(&self, local_root: &Path, pr: PrNumber) -> Result<(), SourceError> {
        let branch = pr.tag();
        let fetch = CommandSpec::tool(&self.git)
            .current_dir(local_root)
            .args(["fetch", "--force", "origin"])
            .arg(format!("+pull/{pr}/head:{branch}"));
        self.git("fetch", fetch, self.clone_timeout).await?;

        let checkout = CommandSpec::tool(&self.git)
            .current_dir(local_root)
            .args(["checkout", "--force", branch.as_str()]);
        self.git("checkout", checkout, self.command_timeout).await?;

        tracing::info!(pr = %pr, path = %local_root.display(), "checked out PR head");
        Ok(())
    }
}
