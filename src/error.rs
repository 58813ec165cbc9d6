//! Error types for tracewal
//!
//! Provides a unified error type for all block operations.

use thiserror::Error;

/// Result type alias using TraceWalError
pub type Result<T> = std::result::Result<T, TraceWalError>;

/// Unified error type for tracewal operations
///
/// A point lookup that finds nothing is `Ok(None)`, never an error.
#[derive(Debug, Error)]
pub enum TraceWalError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Object stream corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Block Errors
    // -------------------------------------------------------------------------
    #[error("Invalid block name: {0}")]
    InvalidBlockName(String),

    #[error("Block already cleared: {0}")]
    BlockCleared(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for TraceWalError {
    fn from(err: bincode::Error) -> Self {
        TraceWalError::Serialization(err.to_string())
    }
}
