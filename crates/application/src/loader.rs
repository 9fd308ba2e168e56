//! Contract Loader
//!
//! Fetches a named contract document, parses it, and checks the
//! structural invariants. Runs wholly before any catalog interaction:
//! fail fast, mutate nothing on invalid input.

use tracing::info;

use pacta_domain::Contract;
use pacta_ports::{ContractSource, ContractSourceError};

use crate::error::ApplyError;

/// Contract loading service
pub struct ContractLoader<S> {
    source: S,
}

impl<S> ContractLoader<S>
where
    S: ContractSource,
{
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Load and validate the contract for `name`.
    pub async fn load(&self, name: &str) -> Result<Contract, ApplyError> {
        let raw = self.source.fetch(name).await.map_err(|err| match err {
            ContractSourceError::NotFound(name) => ApplyError::ContractNotFound(name),
            other => ApplyError::Source(other),
        })?;

        let contract: Contract = serde_yaml::from_str(&raw)
            .map_err(|err| ApplyError::ContractMalformed(err.to_string()))?;
        info!(contract = %contract.name, version = %contract.version, "contract loaded");

        contract
            .validate()
            .map_err(|err| ApplyError::ContractInvalid(err.to_string()))?;
        info!(contract = %contract.name, tables = contract.tables.len(), "contract validated");

        Ok(contract)
    }

    /// Names this loader can resolve.
    pub async fn list(&self) -> Result<Vec<String>, ContractSourceError> {
        self.source.list().await
    }
}
