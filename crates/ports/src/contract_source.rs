//! Contract Source Port
//!
//! A named, versioned document store yielding raw contract documents by
//! name. The engine only needs fetch-by-name and enumeration; where the
//! documents live (directory, object store, memory) is an adapter concern.

use async_trait::async_trait;

/// Contract document store port
#[async_trait]
pub trait ContractSource: Send + Sync {
    /// Fetch the raw document for a contract name.
    async fn fetch(&self, name: &str) -> Result<String, ContractSourceError>;

    /// Enumerate the contract names this source can resolve.
    async fn list(&self) -> Result<Vec<String>, ContractSourceError>;
}

/// Contract source error
#[derive(thiserror::Error, Debug)]
pub enum ContractSourceError {
    #[error("contract not found: {0}")]
    NotFound(String),

    #[error("contract source I/O error: {0}")]
    Io(String),
}
