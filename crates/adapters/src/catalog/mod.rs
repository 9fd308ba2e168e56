//! Catalog Service Adapters
//!
//! The REST client used against real environments, the retry/timeout
//! decorator wrapped around it, and the in-memory catalog every
//! integration test runs against.

pub mod http;
pub mod in_memory;
pub mod retrying;
