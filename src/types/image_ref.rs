// ABOUTME: Container image reference in `repository:tag` form.
// ABOUTME: Builds the canonical preview reference `{namespace}/{repo}-{kind}:pr-{n}`.

use super::pr_number::PrNumber;
use super::repo_slug::RepoSlug;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    repository: String,
    tag: String,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(c) = input.chars().find(|c| {
            !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_' | '@')
        }) {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        // A colon after the last slash separates the tag; earlier colons
        // belong to a registry port.
        let last_slash = input.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (repository, tag) = match input[last_slash..].rfind(':') {
            Some(pos) => {
                let split = last_slash + pos;
                (&input[..split], &input[split + 1..])
            }
            None => (input, "latest"),
        };

        if repository.is_empty() || tag.is_empty() || repository.ends_with('/') {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Canonical reference for a preview image. `kind` is omitted for generic builds.
    pub fn preview(
        registry_namespace: &str,
        repo: &RepoSlug,
        kind: Option<&str>,
        pr: PrNumber,
    ) -> Self {
        let repository = match kind {
            Some(kind) => format!(
                "{}/{}-{}",
                registry_namespace,
                repo.flattened(),
                kind.to_ascii_lowercase()
            ),
            None => format!("{}/{}", registry_namespace, repo.flattened()),
        };
        Self {
            repository,
            tag: pr.tag(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}
