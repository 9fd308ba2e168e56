//! Domain Core - Contract and Catalog Model
//!
//! This crate contains the pure domain of pacta: the declarative contract
//! model, live catalog state snapshots, the diff engine that turns the two
//! into an ordered execution plan, and the run result vocabulary. Nothing in
//! here performs I/O; catalog access lives behind the ports crate.

pub mod catalog;
pub mod contract;
pub mod plan;
pub mod run;

// Shared kernel (cross-cutting concerns)
pub mod shared_kernel {
    pub mod error;
}

pub use crate::shared_kernel::error::{DomainError, DomainResult};

// Re-export the model types for easy importing
pub use crate::catalog::{CatalogObjectState, ObjectKind, QualifiedName};
pub use crate::contract::types::{ColumnSpec, Constraint, DataType, Grant, Privilege};
pub use crate::contract::{Contract, TableContract};
pub use crate::plan::change::{ChangeOperation, TypeCompatibility};
pub use crate::plan::diff::diff;
pub use crate::plan::{ExecutionPlan, PlannedOperation};
pub use crate::run::{OperationOutcome, OperationStatus, RunResult, RunStatus};
