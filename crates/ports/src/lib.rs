//! Ports - Abstraction Layer
//!
//! This crate defines ports (traits) that represent the external
//! capabilities the application layer consumes: the contract document
//! store and the catalog service. These are implemented by adapters; tests
//! use the in-memory implementations from the adapters crate, never mocks
//! at the network layer.

pub mod catalog_service;
pub mod contract_source;

pub use crate::catalog_service::{CatalogError, CatalogService};
pub use crate::contract_source::{ContractSource, ContractSourceError};
