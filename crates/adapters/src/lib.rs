//! Adapters - Infrastructure Implementations
//!
//! This crate contains the implementations of the ports defined in
//! pacta-ports: the configuration layer, contract document sources, the
//! REST catalog client, the retry/timeout decorator, and the in-memory
//! catalog used by every integration test.

pub mod catalog;
pub mod config;
pub mod contract_store;

pub use crate::catalog::http::HttpCatalog;
pub use crate::catalog::in_memory::InMemoryCatalog;
pub use crate::catalog::retrying::RetryingCatalog;
pub use crate::config::{AppConfig, ConfigError, EnvironmentConfig, RetryConfig};
pub use crate::contract_store::{DirectoryContractSource, InMemoryContractSource};
