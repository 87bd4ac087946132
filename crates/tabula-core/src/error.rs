//! Error types for Tabula drivers

use thiserror::Error;

/// Core error type for database operations
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, TabulaError>;
