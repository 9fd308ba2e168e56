//! Contract Document Sources
//!
//! Directory-backed store: one `<name>.yaml` document per contract, with
//! underscore-prefixed files treated as non-contract support documents and
//! skipped during enumeration. The in-memory variant backs tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use pacta_ports::{ContractSource, ContractSourceError};

/// Contract source over a directory of YAML documents.
#[derive(Debug, Clone)]
pub struct DirectoryContractSource {
    root: PathBuf,
}

impl DirectoryContractSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.yaml"))
    }
}

#[async_trait]
impl ContractSource for DirectoryContractSource {
    async fn fetch(&self, name: &str) -> Result<String, ContractSourceError> {
        let path = self.document_path(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ContractSourceError::NotFound(name.to_string()))
            }
            Err(err) => Err(ContractSourceError::Io(format!(
                "reading {}: {err}",
                path.display()
            ))),
        }
    }

    async fn list(&self) -> Result<Vec<String>, ContractSourceError> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // A missing contracts directory means "no contracts", matching
            // an empty enumeration from any other source.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(err) => {
                return Err(ContractSourceError::Io(format!(
                    "listing {}: {err}",
                    self.root.display()
                )))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| ContractSourceError::Io(err.to_string()))?
        {
            if let Some(name) = contract_name(&entry.path()) {
                names.push(name);
            }
        }
        names.sort();
        debug!(count = names.len(), root = %self.root.display(), "enumerated contracts");
        Ok(names)
    }
}

/// Contract name for a directory entry, or `None` for files that are not
/// contract documents (wrong extension, underscore-prefixed).
fn contract_name(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != "yaml" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.starts_with('_') {
        return None;
    }
    Some(stem.to_string())
}

/// In-memory contract source for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContractSource {
    documents: BTreeMap<String, String>,
}

impl InMemoryContractSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: impl Into<String>, document: impl Into<String>) -> Self {
        self.documents.insert(name.into(), document.into());
        self
    }
}

#[async_trait]
impl ContractSource for InMemoryContractSource {
    async fn fetch(&self, name: &str) -> Result<String, ContractSourceError> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| ContractSourceError::NotFound(name.to_string()))
    }

    async fn list(&self) -> Result<Vec<String>, ContractSourceError> {
        Ok(self.documents.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_yaml_documents_skipping_underscore_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("orders.yaml"), "name: orders").unwrap();
        std::fs::write(dir.path().join("customers.yaml"), "name: customers").unwrap();
        std::fs::write(dir.path().join("_shared.yaml"), "anchors: {}").unwrap();
        std::fs::write(dir.path().join("README.md"), "docs").unwrap();

        let source = DirectoryContractSource::new(dir.path());
        let names = source.list().await.unwrap();
        assert_eq!(names, vec!["customers", "orders"]);
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryContractSource::new(dir.path().join("absent"));
        assert!(source.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_distinguishes_not_found_from_io() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("orders.yaml"), "name: orders").unwrap();

        let source = DirectoryContractSource::new(dir.path());
        assert_eq!(source.fetch("orders").await.unwrap(), "name: orders");
        let err = source.fetch("missing").await.unwrap_err();
        assert!(matches!(err, ContractSourceError::NotFound(name) if name == "missing"));
    }
}
