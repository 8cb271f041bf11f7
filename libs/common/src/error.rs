//! Custom error types for the common library
//!
//! This module defines the errors raised by the device-local store.

use thiserror::Error;

/// Custom error type for local persistence
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid key-value document
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
