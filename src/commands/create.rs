// ABOUTME: Create command implementation.
// ABOUTME: Runs the preview engine against the CLI backends and reports the result.

use ephemera::config::Config;
use ephemera::error::Result;
use ephemera::output::Output;
use ephemera::preview::{CliBackends, FailureStage, PreviewEngine};
use ephemera::types::PrNumber;

pub async fn create(
    config: &Config,
    repo_url: &str,
    pr: PrNumber,
    token: Option<String>,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let credential = match token {
        Some(token) => Some(token),
        None => config.credential()?,
    };

    let engine = PreviewEngine::new(config, CliBackends::from_config(config));
    output.progress(&format!("Creating preview of {repo_url} for PR #{pr}"));

    let result = match engine
        .create_preview(repo_url, credential.as_deref(), pr)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            if let FailureStage::PartiallyApplied { namespace, applied } = e.stage() {
                output.warning(&format!(
                    "namespace {namespace} was left in place ({} object(s) applied); \
                     run `ephemera delete --pr {pr}` to remove it",
                    applied.len()
                ));
            }
            return Err(e.into());
        }
    };

    for warning in &result.warnings {
        output.warning(&warning.message);
    }
    for service in &result.services {
        output.progress(&format!(
            "  {} -> node port {} ({})",
            service.workload, service.port.granted_port, service.hostname
        ));
    }

    let namespace = &result.resources.namespace;
    let summary = match &result.service_url {
        Some(url) if result.reachable => format!("Preview {namespace} ready at {url}"),
        Some(url) => format!("Preview {namespace} deployed, not answering yet at {url}"),
        None => format!("Preview {namespace} deployed, no reachable URL"),
    };
    output.result(&summary, &result);
    Ok(())
}
