//! Error types for the Amoeba core.
//!
//! Three families, matching how callers must react:
//!
//! - [`ValidationError`]: an entity was constructed with out-of-range
//!   fields. Raised at construction, never deferred to encode time.
//! - [`FormatError`]: a byte stream could not be decoded. Covers
//!   truncation, bad field widths, unknown algorithm values, the nesting
//!   ceiling, and decoded entities that fail construction invariants.
//! - [`IntegrityError`]: content or certificate verification failed.
//!   Always reported as a `Result` the caller branches on; untrusted
//!   content is an expected outcome, not a panic.

use thiserror::Error;

/// Construction-time validation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is {len} chars, ceiling is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("digest is {len} bytes, ceiling is {max}")]
    DigestTooLong { len: usize, max: usize },

    #[error("invalid erasure parameters: information length {k}, block length {n}")]
    InvalidErasureParams { k: u32, n: u32 },

    #[error("group carries {actual} keys, block length says {expected}")]
    BlockCountMismatch { expected: usize, actual: usize },

    #[error("crypto algorithm is set but no crypto key was provided")]
    MissingCryptoKey,

    #[error("crypto key provided without a crypto algorithm")]
    UnexpectedCryptoKey,

    #[error("box holds {count} seeds, ceiling is {max}")]
    TooManySeeds { count: usize, max: usize },

    #[error("box holds {count} boxes, ceiling is {max}")]
    TooManyBoxes { count: usize, max: usize },
}

/// Decode failures on a byte stream.
///
/// Anything here means the input is malformed or hostile; decode aborts
/// immediately and nothing partial is returned.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("truncated stream: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("record length {length} exceeds the {remaining} remaining bytes")]
    LengthOutOfRange { length: usize, remaining: usize },

    #[error("field tag {tag} is {len} bytes wide, expected {expected}")]
    BadFieldWidth { tag: u8, len: usize, expected: usize },

    #[error("unknown {family} algorithm value {value}")]
    UnknownAlgorithm { family: &'static str, value: u8 },

    #[error("invalid utf-8 in string field")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("nesting depth exceeds the ceiling of {limit}")]
    DepthExceeded { limit: usize },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Verification failures: a signature or a content digest did not match.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("no certificate to verify")]
    MissingCertificate,

    #[error("certificate signature does not verify")]
    BadSignature,

    #[error("certificate public key is not a valid curve point")]
    MalformedPublicKey,

    #[error("content digest mismatch: key says {expected}, content is {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("canonical form unavailable: {0}")]
    Canonical(#[from] FormatError),
}
