//! Domain Error Types
//!
//! Centralized error handling for the domain layer

/// Result type for domain operations
pub type DomainResult<T> = std::result::Result<T, DomainError>;

/// Main domain error enum
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid object name: {0}")]
    InvalidName(String),

    #[error("unknown data type: {0}")]
    UnknownType(String),
}
