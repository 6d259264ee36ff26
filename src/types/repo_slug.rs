// ABOUTME: Repository identity in `owner/name` form.
// ABOUTME: Parsed from a slug or an https/ssh clone URL.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoSlugError {
    #[error("repository must be in owner/name form: {0}")]
    InvalidFormat(String),

    #[error("invalid character in repository: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    owner: String,
    name: String,
}

impl RepoSlug {
    pub fn parse(input: &str) -> Result<Self, RepoSlugError> {
        let trimmed = input.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| RepoSlugError::InvalidFormat(input.to_string()))?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(RepoSlugError::InvalidFormat(input.to_string()));
        }

        for c in owner.chars().chain(name.chars()) {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
                return Err(RepoSlugError::InvalidChar(c));
            }
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Accepts `https://host/owner/name(.git)`, `git@host:owner/name(.git)` or a bare slug.
    pub fn from_url(url: &str) -> Result<Self, RepoSlugError> {
        let url = url.trim();
        if let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
        {
            let path = rest
                .split_once('/')
                .map(|(_, path)| path)
                .ok_or_else(|| RepoSlugError::InvalidFormat(url.to_string()))?;
            return Self::parse(path);
        }
        if let Some(rest) = url.strip_prefix("git@") {
            let path = rest
                .split_once(':')
                .map(|(_, path)| path)
                .ok_or_else(|| RepoSlugError::InvalidFormat(url.to_string()))?;
            return Self::parse(path);
        }
        Self::parse(url)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `owner-name`, lowercased. Used for image repositories and checkout directories.
    pub fn flattened(&self) -> String {
        format!("{}-{}", self.owner, self.name).to_ascii_lowercase()
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl Serialize for RepoSlug {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}
