// ABOUTME: Application-wide error types for ephemera.
// ABOUTME: Config, IO and command-level failures; preview failures nest as PreviewError.

use std::path::PathBuf;
use thiserror::Error;

use crate::build::ClassifyError;
use crate::preview::PreviewError;
use crate::types::PrNumber;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("cannot read secret from {path:?}: {source}")]
    SecretFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error("classification failed: {0}")]
    Classify(#[from] ClassifyError),

    #[error("teardown of PR {pr} incomplete: {failures} resource(s) could not be removed")]
    TeardownIncomplete { pr: PrNumber, failures: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
