//! Error types for the content pipeline.

use thiserror::Error;

use amoeba_core::{FormatError, IntegrityError, ValidationError};
use amoeba_store::StoreError;

/// Errors produced while encoding, storing, or fetching content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Not enough blocks are present to reconstruct a group. This is an
    /// expected condition while content is still arriving, not a fault.
    #[error("insufficient blocks: have {have}, need {need}")]
    InsufficientBlocks { have: usize, need: usize },

    #[error("erasure coding error: {0}")]
    Erasure(String),

    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error("encryption error: {0}")]
    Crypto(String),

    #[error("crypto key material is {len} bytes, expected {expected}")]
    InvalidCryptoKey { len: usize, expected: usize },

    #[error("block size must be positive")]
    ZeroBlockSize,
}

pub type Result<T> = std::result::Result<T, ContentError>;
