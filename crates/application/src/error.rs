//! Apply Error Types
//!
//! Pre-flight failures of one apply run. Every variant here aborts the run
//! before any catalog mutation; execution-phase failures are recorded
//! per-operation in the run result instead.

use pacta_ports::{CatalogError, ContractSourceError};

/// Pre-flight apply error
#[derive(thiserror::Error, Debug)]
pub enum ApplyError {
    #[error("contract not found: {0}")]
    ContractNotFound(String),

    #[error("contract malformed: {0}")]
    ContractMalformed(String),

    #[error("contract invalid: {0}")]
    ContractInvalid(String),

    #[error("contract source error: {0}")]
    Source(ContractSourceError),

    #[error("catalog read failed: {0}")]
    CatalogRead(#[from] CatalogError),
}
