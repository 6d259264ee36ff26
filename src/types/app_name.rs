// ABOUTME: DNS-compatible application name derived from a repository name.
// ABOUTME: Used as the base for deployment, service and ingress object names.

use super::repo_slug::RepoSlug;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Room is left below the 63-character label limit for `-frontend-service`
/// style suffixes.
const MAX_LEN: usize = 40;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppNameError {
    #[error("application name cannot be empty")]
    Empty,

    #[error("application name exceeds maximum length of {MAX_LEN} characters")]
    TooLong,

    #[error("application name cannot start or end with a hyphen")]
    EdgeHyphen,

    #[error("invalid character in application name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AppName(String);

impl AppName {
    pub fn new(value: &str) -> Result<Self, AppNameError> {
        if value.is_empty() {
            return Err(AppNameError::Empty);
        }
        if value.len() > MAX_LEN {
            return Err(AppNameError::TooLong);
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(AppNameError::EdgeHyphen);
        }
        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(AppNameError::InvalidChar(c));
        }
        Ok(Self(value.to_string()))
    }

    /// Sanitise the repository name: lowercase, every other character becomes
    /// a hyphen, edges trimmed.
    pub fn from_repository(repo: &RepoSlug) -> Self {
        let mut sanitized: String = repo
            .name()
            .chars()
            .map(|c| {
                let c = c.to_ascii_lowercase();
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        sanitized.truncate(MAX_LEN);
        let trimmed = sanitized.trim_matches('-');
        if trimmed.is_empty() {
            Self("app".to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
