// ABOUTME: Plan command implementation.
// ABOUTME: Classifies a local checkout and prints the build plans it would produce.

use std::path::Path;

use ephemera::build::{BuildPlan, BuildSource, PlanNaming, classify};
use ephemera::config::Config;
use ephemera::error::Result;
use ephemera::output::Output;
use ephemera::types::{PrNumber, RepoSlug};

pub fn plan(
    config: &Config,
    root: &Path,
    repository: &RepoSlug,
    pr: PrNumber,
    output: &Output,
) -> Result<()> {
    let naming = PlanNaming {
        registry_namespace: config.registry_namespace.clone(),
        repository: repository.clone(),
        pr,
    };
    let plans = classify(root, &naming)?;

    for plan in &plans {
        output.progress(&describe(plan));
    }
    output.result(&format!("{} build plan(s)", plans.len()), &plans);
    Ok(())
}

fn describe(plan: &BuildPlan) -> String {
    let source = match &plan.source {
        BuildSource::Dockerfile { path: None } => "Dockerfile".to_string(),
        BuildSource::Dockerfile { path: Some(path) } => format!("-f {}", path.display()),
        BuildSource::ComposeService {
            descriptor,
            service,
            ..
        } => format!("{} service {service}", descriptor.display()),
        BuildSource::Prebuilt { image } => format!("prebuilt {image}"),
    };
    format!(
        "  {:?} -> {} ({source}, context {})",
        plan.strategy,
        plan.image_ref,
        plan.build_context.display()
    )
}
