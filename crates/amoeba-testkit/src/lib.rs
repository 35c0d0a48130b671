//! # Amoeba Testkit
//!
//! Testing utilities for the Amoeba content store.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known canonical encodings with expected bytes for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! Golden vectors ensure deterministic canonical encoding across implementations:
//!
//! ```rust
//! use amoeba_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     let bytes = (vector.build)();
//!     println!("{}: {}", vector.name, hex::encode(bytes));
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use amoeba_testkit::generators::{seed_from_params, SeedParams};
//!
//! proptest! {
//!     #[test]
//!     fn seed_bytes_are_deterministic(params: SeedParams) {
//!         let s1 = seed_from_params(&params);
//!         let s2 = seed_from_params(&params);
//!         prop_assert_eq!(s1.to_canonical_bytes(), s2.to_canonical_bytes());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use amoeba_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let seed = fixture.make_seed("clip.mp4", b"frames");
//! seed.verify_certificate().unwrap();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, random_payload, TestFixture};
pub use generators::{group_from_params, seed_from_params, GroupParams, SeedParams};
pub use vectors::{
    all_vectors, export_vectors_json, verify_all_vectors, GoldenVector, VectorRecord,
};
