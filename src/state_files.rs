// ABOUTME: Records of background processes spawned for a preview.
// ABOUTME: Stored as `{namespace}-{role}.pid` JSON files in the state directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{NamespaceName, PrNumber};

const RECORD_EXTENSION: &str = "pid";

/// A process left running on behalf of a preview namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Process ID.
    pub pid: u32,
    /// What the process does (`tunnel`, `{service}-forward`).
    pub role: String,
    /// Local port the process listens on, if any.
    #[serde(default)]
    pub local_port: Option<u16>,
    /// When the process was started.
    pub started_at: DateTime<Utc>,
}

impl ProcessRecord {
    pub fn new(pid: u32, role: impl Into<String>, local_port: Option<u16>) -> Self {
        Self {
            pid,
            role: role.into(),
            local_port,
            started_at: Utc::now(),
        }
    }

    pub fn path(dir: &Path, namespace: &NamespaceName, role: &str) -> PathBuf {
        dir.join(format!("{namespace}-{role}.{RECORD_EXTENSION}"))
    }

    pub fn write(&self, dir: &Path, namespace: &NamespaceName) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = Self::path(dir, namespace, &self.role);
        let json = serde_json::to_string(self).map_err(std::io::Error::other)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// Namespace a state file belongs to, if its name starts with one.
///
/// `pr-4-1-web-service.yaml` belongs to `pr-4-1`, never to `pr-4`.
pub fn owning_namespace(file_name: &str) -> Option<NamespaceName> {
    let mut parts = file_name.splitn(4, '-');
    if parts.next()? != "pr" {
        return None;
    }
    let pr = parts.next()?;
    let base = NamespaceName::parse(&format!("pr-{pr}")).ok()?;

    // a numeric segment is a namespace suffix only when more name follows it
    match (parts.next(), parts.next()) {
        (Some(suffix), Some(_)) => {
            Some(NamespaceName::parse(&format!("pr-{pr}-{suffix}")).unwrap_or(base))
        }
        _ => Some(base),
    }
}

/// State files written for any namespace of `pr`, sorted by path.
pub fn files_for_pr(dir: &Path, pr: PrNumber) -> std::io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| {
            owning_namespace(&entry.file_name().to_string_lossy())
                .is_some_and(|ns| ns.belongs_to(pr))
        })
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}

/// Process records among `files`. Unreadable or malformed records are skipped.
pub fn read_records(files: &[PathBuf]) -> Vec<(PathBuf, ProcessRecord)> {
    files
        .iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == RECORD_EXTENSION))
        .filter_map(|path| {
            let text = std::fs::read_to_string(path).ok()?;
            match serde_json::from_str(&text) {
                Ok(record) => Some((path.clone(), record)),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "ignoring malformed process record");
                    None
                }
            }
        })
        .collect()
}
