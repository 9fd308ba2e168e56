//! Application Layer
//!
//! Orchestrates the domain against the ports: loads and validates a
//! contract, reads live catalog state, plans, executes, and reports. The
//! orchestrator is the only component the invocation layer talks to.

pub mod error;
pub mod executor;
pub mod loader;
pub mod orchestrator;
pub mod reader;

// Re-exports
pub use error::ApplyError;
pub use executor::PlanExecutor;
pub use loader::ContractLoader;
pub use orchestrator::ApplyOrchestrator;
pub use reader::StateReader;
