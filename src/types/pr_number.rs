// ABOUTME: Pull-request number newtype.
// ABOUTME: Non-zero, and the source of the `pr-{n}` naming used for namespaces and tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrNumberError {
    #[error("pull request number must be greater than zero")]
    Zero,

    #[error("invalid pull request number: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PrNumber(u64);

impl PrNumber {
    pub fn new(value: u64) -> Result<Self, PrNumberError> {
        if value == 0 {
            return Err(PrNumberError::Zero);
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Tag shared by every image and the base namespace of this PR: `pr-{n}`.
    pub fn tag(self) -> String {
        format!("pr-{}", self.0)
    }
}

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PrNumber {
    type Err = PrNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('#');
        let value = trimmed
            .parse::<u64>()
            .map_err(|_| PrNumberError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<u64> for PrNumber {
    type Error = PrNumberError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrNumber> for u64 {
    fn from(pr: PrNumber) -> Self {
        pr.0
    }
}
