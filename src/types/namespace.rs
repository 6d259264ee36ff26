// ABOUTME: Preview namespace names of the form `pr-{n}` or `pr-{n}-{k}`.
// ABOUTME: Knows which PR it belongs to and its collision suffix.

use super::pr_number::PrNumber;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Kubernetes caps namespace names at one DNS label.
const MAX_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceNameError {
    #[error("namespace name exceeds maximum length of {MAX_LEN} characters")]
    TooLong,

    #[error("not a preview namespace: {0}")]
    NotPreview(String),
}

/// A namespace owned by one preview environment.
///
/// `suffix` is 0 for the base name `pr-{n}` and `k >= 1` for `pr-{n}-{k}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName {
    name: String,
    pr: PrNumber,
    suffix: u32,
}

impl NamespaceName {
    pub fn for_pr(pr: PrNumber, suffix: u32) -> Self {
        let name = if suffix == 0 {
            pr.tag()
        } else {
            format!("{}-{}", pr.tag(), suffix)
        };
        Self { name, pr, suffix }
    }

    /// Parse an existing namespace name. Only the exact `pr-{n}(-{k})?` shape is
    /// accepted, so `pr-420` never parses as belonging to PR 42.
    pub fn parse(value: &str) -> Result<Self, NamespaceNameError> {
        if value.len() > MAX_LEN {
            return Err(NamespaceNameError::TooLong);
        }
        let not_preview = || NamespaceNameError::NotPreview(value.to_string());

        let rest = value.strip_prefix("pr-").ok_or_else(not_preview)?;
        let (pr_part, suffix_part) = match rest.split_once('-') {
            Some((pr, suffix)) => (pr, Some(suffix)),
            None => (rest, None),
        };

        let pr = parse_digits(pr_part)
            .and_then(|n| PrNumber::new(n).ok())
            .ok_or_else(not_preview)?;
        let suffix = match suffix_part {
            None => 0,
            Some(s) => match parse_digits(s) {
                Some(k) if (1..=u64::from(u32::MAX)).contains(&k) => k as u32,
                _ => return Err(not_preview()),
            },
        };

        let parsed = Self::for_pr(pr, suffix);
        // Reject non-canonical spellings such as `pr-042`.
        if parsed.name != value {
            return Err(not_preview());
        }
        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn pr_number(&self) -> PrNumber {
        self.pr
    }

    /// Trailing numeric suffix, 0 when the namespace is the bare `pr-{n}`.
    pub fn suffix(&self) -> u32 {
        self.suffix
    }

    pub fn belongs_to(&self, pr: PrNumber) -> bool {
        self.pr == pr
    }

    /// True if `name` is one of the namespaces a preview of `pr` could own.
    pub fn matches_pr(name: &str, pr: PrNumber) -> bool {
        Self::parse(name).is_ok_and(|ns| ns.belongs_to(pr))
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Serialize for NamespaceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.name.serialize(serializer)
    }
}
