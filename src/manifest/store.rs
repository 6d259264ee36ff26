// ABOUTME: Writes rendered manifests to the state directory for `kubectl apply -f`.
// ABOUTME: File names start with the namespace so teardown can find them.

use std::path::{Path, PathBuf};

use super::document::ManifestDocument;

#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a document for `workload` is written to.
    pub fn path_for(&self, document: &ManifestDocument, workload: &str) -> PathBuf {
        self.dir.join(format!(
            "{}-{}-{}",
            document.namespace, workload, document.template_id
        ))
    }

    /// Write the document, replacing any earlier render of the same template.
    pub fn write(
        &self,
        document: &ManifestDocument,
        workload: &str,
    ) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(document, workload);
        std::fs::write(&path, &document.content)?;
        tracing::debug!(path = %path.display(), "manifest written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NamespaceName;

    #[test]
    fn writes_under_namespace_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("state"));
        let namespace = NamespaceName::parse("pr-3-1").unwrap();
        let doc = ManifestDocument {
            template_id: "service.yaml".to_string(),
            pr_number: namespace.pr_number(),
            namespace,
            content: "kind: Service\n".to_string(),
        };

        let path = store.write(&doc, "web").unwrap();
        assert_eq!(path.file_name().unwrap(), "pr-3-1-web-service.yaml");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "kind: Service\n");
    }
}
