//! Catalog Service Port
//!
//! The live catalog capability: existence check, read-structure, and the
//! DDL/grant operation set, each a single call with its own latency and
//! failure profile. Reads never conflate "object does not exist" with a
//! failed call; non-existence is normal input to the diff.

use async_trait::async_trait;
use std::collections::BTreeSet;

use pacta_domain::{CatalogObjectState, ColumnSpec, Constraint, DataType, Privilege, QualifiedName};

/// Catalog service port
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Check whether an object exists.
    async fn object_exists(&self, name: &QualifiedName) -> Result<bool, CatalogError>;

    /// Read the current structure of an object. A missing object is
    /// returned with `exists = false`, not as an error.
    async fn read_structure(&self, name: &QualifiedName) -> Result<CatalogObjectState, CatalogError>;

    /// Create an object with the given desired structure. Creating an
    /// object that already exists is a no-op, not an error.
    async fn create_object(&self, desired: &CatalogObjectState) -> Result<(), CatalogError>;

    /// Add a column to an existing table.
    async fn add_column(
        &self,
        table: &QualifiedName,
        column: &ColumnSpec,
    ) -> Result<(), CatalogError>;

    /// Drop a column from an existing table.
    async fn drop_column(&self, table: &QualifiedName, column: &str) -> Result<(), CatalogError>;

    /// Change the type of an existing column.
    async fn alter_column_type(
        &self,
        table: &QualifiedName,
        column: &str,
        to: &DataType,
    ) -> Result<(), CatalogError>;

    /// Add a constraint to an existing table.
    async fn add_constraint(
        &self,
        table: &QualifiedName,
        constraint: &Constraint,
    ) -> Result<(), CatalogError>;

    /// Drop a constraint by name.
    async fn drop_constraint(
        &self,
        table: &QualifiedName,
        constraint: &str,
    ) -> Result<(), CatalogError>;

    /// Grant privileges on an object to a principal.
    async fn grant(
        &self,
        object: &QualifiedName,
        principal: &str,
        privileges: &BTreeSet<Privilege>,
    ) -> Result<(), CatalogError>;

    /// Revoke privileges on an object from a principal.
    async fn revoke(
        &self,
        object: &QualifiedName,
        principal: &str,
        privileges: &BTreeSet<Privilege>,
    ) -> Result<(), CatalogError>;
}

/// Catalog service error
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// Timeout, rate limit, connection loss. Retried with bounded backoff.
    #[error("transient catalog failure: {0}")]
    Transient(String),

    /// The caller lacks the privilege for this operation. Never retried.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The catalog rejected the statement as structurally invalid. Never
    /// retried.
    #[error("invalid DDL: {0}")]
    InvalidDdl(String),

    /// The catalog endpoint is unreachable or misconfigured.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    /// Whether the retry policy applies to this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
