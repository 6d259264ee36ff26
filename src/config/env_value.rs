// ABOUTME: Secret config values: inline, from an environment variable, or from a file.
// ABOUTME: Keeps clone tokens out of ephemera.yml and out of debug logs.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use serde::Deserialize;

/// A credential as written in the config file.
///
/// ```yaml
/// token: ghp_inline            # literal
/// token: { env: GITHUB_TOKEN } # environment, optional `default`
/// token: { file: /run/secrets/github-token }
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
    FromFile {
        file: PathBuf,
    },
}

impl EnvValue {
    /// Resolve to the secret itself. Files are read at call time and
    /// trailing whitespace is dropped.
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
            EnvValue::FromFile { file } => std::fs::read_to_string(file)
                .map(|s| s.trim_end().to_string())
                .map_err(|source| Error::SecretFile {
                    path: file.clone(),
                    source,
                }),
        }
    }
}

impl fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(_) => f.write_str("Literal(***)"),
            EnvValue::FromEnv { var, default } => f
                .debug_struct("FromEnv")
                .field("var", var)
                .field("default", &default.as_ref().map(|_| "***"))
                .finish(),
            EnvValue::FromFile { file } => f.debug_struct("FromFile").field("file", file).finish(),
        }
    }
}
