// ABOUTME: Teardown report: what was found and removed, and what could not be.
// ABOUTME: Per-resource failures make the status Partial instead of failing the call.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::types::PrNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TeardownStatus {
    Success,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TeardownStep {
    Namespaces,
    Images,
    Processes,
    Files,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TeardownStep::Namespaces => "namespaces",
            TeardownStep::Images => "images",
            TeardownStep::Processes => "processes",
            TeardownStep::Files => "files",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownFailure {
    pub step: TeardownStep,
    /// What could not be removed (or listed).
    pub resource: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminatedProcess {
    pub pid: u32,
    /// Port the process was found listening on, if found that way.
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub pr_number: PrNumber,
    pub status: TeardownStatus,
    pub namespaces: Vec<String>,
    pub images: Vec<String>,
    pub processes: Vec<TerminatedProcess>,
    pub files: Vec<PathBuf>,
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    pub fn new(pr_number: PrNumber) -> Self {
        Self {
            pr_number,
            status: TeardownStatus::Success,
            namespaces: Vec::new(),
            images: Vec::new(),
            processes: Vec::new(),
            files: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn fail(
        &mut self,
        step: TeardownStep,
        resource: impl Into<String>,
        error: impl ToString,
    ) {
        let failure = TeardownFailure {
            step,
            resource: resource.into(),
            error: error.to_string(),
        };
        tracing::warn!(
            step = %failure.step,
            resource = %failure.resource,
            error = %failure.error,
            "teardown step failed"
        );
        self.failures.push(failure);
        self.status = TeardownStatus::Partial;
    }

    pub fn is_success(&self) -> bool {
        self.status == TeardownStatus::Success
    }

    /// Nothing was found to remove.
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
            && self.images.is_empty()
            && self.processes.is_empty()
            && self.files.is_empty()
    }
}
