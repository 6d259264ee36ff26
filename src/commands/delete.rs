// ABOUTME: Delete command implementation.
// ABOUTME: Tears down every preview of a PR and fails if anything was left behind.

use ephemera::config::Config;
use ephemera::error::{Error, Result};
use ephemera::output::Output;
use ephemera::preview::{CliBackends, PreviewEngine};
use ephemera::types::PrNumber;

pub async fn delete(config: &Config, pr: PrNumber, mut output: Output) -> Result<()> {
    output.start_timer();
    let engine = PreviewEngine::new(config, CliBackends::from_config(config));
    output.progress(&format!("Removing previews of PR #{pr}"));

    let report = engine.delete_preview(pr).await;

    for failure in &report.failures {
        output.warning(&format!(
            "{} {}: {}",
            failure.step, failure.resource, failure.error
        ));
    }

    let summary = if report.is_empty() {
        format!("Nothing to remove for PR #{pr}")
    } else {
        format!(
            "Removed {} namespace(s), {} image(s), {} process(es), {} file(s)",
            report.namespaces.len(),
            report.images.len(),
            report.processes.len(),
            report.files.len()
        )
    };
    output.result(&summary, &report);

    if report.is_success() {
        Ok(())
    } else {
        Err(Error::TeardownIncomplete {
            pr,
            failures: report.failures.len(),
        })
    }
}
