//! Content encoding and reconstruction for Amoeba.
//!
//! This crate turns payloads into the block sets that indices describe and
//! turns stored blocks back into payloads:
//!
//! - [`transform`]: whole-payload compression and encryption
//! - [`erasure`]: per-group erasure coding
//! - [`pipeline`]: chunking, hashing, storing, and fetching
//!
//! Everything here is deterministic given the index: two peers holding the
//! same index and any sufficient subset of its blocks rebuild identical
//! payloads.

pub mod erasure;
pub mod error;
pub mod pipeline;
pub mod transform;

pub use error::{ContentError, Result};
pub use pipeline::{
    encode_payload, fetch_payload, store_content, EncodeOptions, EncodedContent,
    DEFAULT_BLOCK_LENGTH, DEFAULT_BLOCK_SIZE, DEFAULT_INFORMATION_LENGTH,
};
pub use transform::ContentSecret;
