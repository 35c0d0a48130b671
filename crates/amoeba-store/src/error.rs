//! Error types for the store module.

use thiserror::Error;

use amoeba_core::IntegrityError;

/// Errors that can occur during block store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A block failed verification against its key.
    #[error("integrity failure: {0}")]
    Integrity(#[from] IntegrityError),

    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
