// ABOUTME: Classifies a repository checkout into build plans.
// ABOUTME: An ordered chain of detectors: compose descriptor, frontend/backend dirs, generic.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::compose::{ComposeFile, DESCRIPTOR_NAMES};
use super::error::ClassifyError;
use super::plan::{BuildPlan, BuildSource, BuildStrategy, PlanNaming};
use crate::types::ImageRef;

const BUILD_FILE: &str = "Dockerfile";

static PARENT_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:COPY|ADD)[ \t]+(?:\S+[ \t]+)*?\.\./").expect("static regex")
});

/// A detector returns `Some` when it recognises the layout.
type Detector = fn(&Path, &PlanNaming) -> Result<Option<Vec<BuildPlan>>, ClassifyError>;

const DETECTORS: [Detector; 3] = [detect_compose, detect_split, detect_generic];

/// Classify the checkout at `root` into one or more build plans.
///
/// Detectors run in order and the first match wins. Unreadable directories
/// count as absent.
pub fn classify(root: &Path, naming: &PlanNaming) -> Result<Vec<BuildPlan>, ClassifyError> {
    for detector in DETECTORS {
        if let Some(plans) = detector(root, naming)? {
            tracing::debug!(
                root = %root.display(),
                plans = plans.len(),
                "classified repository"
            );
            return Ok(plans);
        }
    }
    Err(ClassifyError::NoPlans {
        root: root.to_path_buf(),
    })
}

// =============================================================================
// Directory helpers
// =============================================================================

/// Immediate subdirectories worth descending into, sorted by name.
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && name != "node_modules"
        })
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    dirs
}

/// Look for something at the root first, then one level down.
fn find_shallow<F>(root: &Path, probe: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> Option<PathBuf>,
{
    probe(root).or_else(|| subdirectories(root).iter().find_map(|dir| probe(dir)))
}

fn find_descriptor(root: &Path) -> Option<PathBuf> {
    find_shallow(root, |dir| {
        DESCRIPTOR_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}

fn find_named_dir(root: &Path, name: &str) -> Option<PathBuf> {
    find_shallow(root, |dir| {
        let candidate = dir.join(name);
        candidate.is_dir().then_some(candidate)
    })
}

/// Build context and explicit build file for a directory.
///
/// When the build file copies from `../`, the context moves up one level and
/// the build file is passed explicitly.
fn build_context(dir: &Path) -> (PathBuf, BuildSource) {
    let build_file = dir.join(BUILD_FILE);
    let references_parent = std::fs::read_to_string(&build_file)
        .map(|text| PARENT_SOURCE.is_match(&text))
        .unwrap_or(false);

    match dir.parent() {
        Some(parent) if references_parent => (
            parent.to_path_buf(),
            BuildSource::Dockerfile {
                path: Some(build_file),
            },
        ),
        _ => (dir.to_path_buf(), BuildSource::Dockerfile { path: None }),
    }
}

fn dockerfile_plan(dir: &Path, strategy: BuildStrategy, naming: &PlanNaming) -> BuildPlan {
    let (build_context, source) = build_context(dir);
    BuildPlan {
        image_ref: naming.image_for(&strategy),
        strategy,
        build_context,
        source,
    }
}

// =============================================================================
// Detectors
// =============================================================================

fn detect_compose(
    root: &Path,
    naming: &PlanNaming,
) -> Result<Option<Vec<BuildPlan>>, ClassifyError> {
    let Some(descriptor) = find_descriptor(root) else {
        return Ok(None);
    };
    let file = ComposeFile::load(&descriptor).map_err(|source| ClassifyError::Compose {
        path: descriptor.clone(),
        source,
    })?;
    let descriptor_dir = descriptor.parent().unwrap_or(root).to_path_buf();

    let mut plans = Vec::with_capacity(file.services().len());
    for service in file.services() {
        let strategy = BuildStrategy::Compose {
            service: service.name.clone(),
        };

        let plan = match &service.build_context {
            Some(context) => BuildPlan {
                image_ref: naming.image_for(&strategy),
                strategy,
                build_context: context.clone(),
                source: BuildSource::ComposeService {
                    descriptor: descriptor.clone(),
                    service: service.name.clone(),
                    generated_image: file.generated_image(service),
                },
            },
            None => {
                let image = file.generated_image(service);
                let image_ref =
                    ImageRef::parse(&image).map_err(|_| ClassifyError::InvalidImage {
                        service: service.name.clone(),
                        image: image.clone(),
                    })?;
                BuildPlan {
                    image_ref,
                    strategy,
                    build_context: descriptor_dir.clone(),
                    source: BuildSource::Prebuilt { image },
                }
            }
        };
        plans.push(plan);
    }

    Ok(Some(plans))
}

fn detect_split(
    root: &Path,
    naming: &PlanNaming,
) -> Result<Option<Vec<BuildPlan>>, ClassifyError> {
    let plans: Vec<BuildPlan> = [
        ("frontend", BuildStrategy::Frontend),
        ("backend", BuildStrategy::Backend),
    ]
    .into_iter()
    .filter_map(|(name, strategy)| {
        find_named_dir(root, name).map(|dir| dockerfile_plan(&dir, strategy, naming))
    })
    .collect();

    Ok((!plans.is_empty()).then_some(plans))
}

fn detect_generic(
    root: &Path,
    naming: &PlanNaming,
) -> Result<Option<Vec<BuildPlan>>, ClassifyError> {
    Ok(Some(vec![dockerfile_plan(
        root,
        BuildStrategy::Generic,
        naming,
    )]))
}
