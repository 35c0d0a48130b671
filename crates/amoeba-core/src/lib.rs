//! # Amoeba Core
//!
//! Pure primitives for the Amoeba content store: content addressing,
//! erasure-group bookkeeping, and the signed metadata tree.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`Key`] - Content fingerprint of one block (hash algorithm + digest)
//! - [`Group`] - One erasure-coded slice: parameters plus ordered block keys
//! - [`Index`] - Ordered groups plus the transform tags for one payload
//! - [`Seed`] - User-facing content descriptor pointing at an [`Index`]
//! - [`SeedBox`] - Signed directory tree of seeds and nested boxes
//!
//! ## Canonical encoding
//!
//! Every entity serializes through the tag-length-value format in the
//! [`wire`] module. Equal entities produce byte-identical encodings, so
//! hashing and signing are deterministic.

pub mod certificate;
pub mod error;
pub mod group;
pub mod index;
pub mod key;
pub mod seed;
pub mod seed_box;
pub mod wire;

pub use certificate::{Certificate, Ed25519PublicKey, Ed25519Signature, Keypair, SignatureAlgorithm};
pub use error::{FormatError, IntegrityError, ValidationError};
pub use group::{CorrectionAlgorithm, Group};
pub use index::{CompressionAlgorithm, CryptoAlgorithm, Index};
pub use key::{HashAlgorithm, Key, MAX_DIGEST_LEN};
pub use seed::{Seed, SeedBuilder, MAX_COMMENT_LEN, MAX_KEYWORD_LEN, MAX_NAME_LEN};
pub use seed_box::{SeedBox, SeedBoxBuilder, MAX_BOXES, MAX_BOX_DEPTH, MAX_SEEDS};
