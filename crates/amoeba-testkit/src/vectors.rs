//! Golden encoding vectors for deterministic verification.
//!
//! These vectors pin the canonical byte layout so every implementation of
//! the wire format produces identical output.

use serde::{Deserialize, Serialize};

use amoeba_core::{
    CompressionAlgorithm, CorrectionAlgorithm, CryptoAlgorithm, Group, HashAlgorithm, Index, Key,
    Keypair, SeedBoxBuilder, SeedBuilder,
};

/// A golden encoding vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Builds the canonical bytes under test.
    pub build: fn() -> Vec<u8>,
    /// Expected canonical bytes in hex, or `None` to pin determinism only.
    pub expected_hex: Option<&'static str>,
}

/// Get all golden encoding vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "key with a short digest",
            build: || {
                Key::new(HashAlgorithm::Blake3, vec![1, 2, 3])
                    .expect("digest fits")
                    .to_canonical_bytes()
            },
            expected_hex: Some("0300000001010203"),
        },
        GoldenVector {
            name: "default key encodes to nothing",
            build: || Key::default().to_canonical_bytes(),
            expected_hex: Some(""),
        },
        GoldenVector {
            name: "single-block group without correction",
            build: || {
                Group::new(CorrectionAlgorithm::None, 1, 1, 0, vec![Key::default()])
                    .expect("parameters are valid")
                    .to_canonical_bytes()
            },
            expected_hex: Some("0400000001010000000400000002010000000000000004"),
        },
        GoldenVector {
            name: "deflate index with one group",
            build: || {
                let group = Group::new(CorrectionAlgorithm::None, 1, 1, 0, vec![Key::default()])
                    .expect("parameters are valid");
                Index::new(
                    CompressionAlgorithm::Deflate,
                    CryptoAlgorithm::None,
                    None,
                    vec![group],
                )
                .expect("parameters are valid")
                .to_canonical_bytes()
            },
            expected_hex: Some(
                "0100000000011700000003\
                 0400000001010000000400000002010000000000000004",
            ),
        },
        GoldenVector {
            name: "seed with only a name",
            build: || {
                SeedBuilder::new("a")
                    .build()
                    .expect("name is within limits")
                    .to_canonical_bytes()
            },
            expected_hex: Some("010000000061"),
        },
        GoldenVector {
            name: "seed with name, length, and rank",
            build: || {
                SeedBuilder::new("demo.bin")
                    .length(5)
                    .rank(2)
                    .build()
                    .expect("fields are within limits")
                    .to_canonical_bytes()
            },
            expected_hex: Some(
                "080000000064656d6f2e62696e\
                 08000000010500000000000000\
                 040000000502000000",
            ),
        },
        GoldenVector {
            name: "signed seed is deterministic",
            build: || {
                let keypair = Keypair::from_seed(&[0x42; 32]);
                SeedBuilder::new("video.mp4")
                    .length(10_485_760)
                    .creation_time(1_736_870_400_000)
                    .keyword("video")
                    .key(Key::for_content(b"index bytes"))
                    .sign(&keypair)
                    .expect("fields are within limits")
                    .to_canonical_bytes()
            },
            expected_hex: None,
        },
        GoldenVector {
            name: "nested box is deterministic",
            build: || {
                let keypair = Keypair::from_seed(&[0x07; 32]);
                let seed = SeedBuilder::new("inner.bin")
                    .length(4)
                    .key(Key::for_content(b"data"))
                    .sign(&keypair)
                    .expect("fields are within limits");
                let inner = SeedBoxBuilder::new("discs")
                    .add_seed(seed)
                    .sign(&keypair)
                    .expect("nesting is within limits");
                SeedBoxBuilder::new("library")
                    .comment("vectors")
                    .add_box(inner)
                    .sign(&keypair)
                    .expect("nesting is within limits")
                    .to_canonical_bytes()
                    .expect("nesting is within limits")
            },
            expected_hex: None,
        },
    ]
}

/// Check every vector, returning (name, matches, actual hex).
///
/// Vectors without expected bytes pass when two builds agree.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|vector| {
            let actual = hex::encode((vector.build)());
            let matches = match vector.expected_hex {
                Some(expected) => actual == expected,
                None => (vector.build)() == (vector.build)(),
            };
            (vector.name.to_string(), matches, actual)
        })
        .collect()
}

/// A vector in exportable form.
#[derive(Debug, Serialize, Deserialize)]
pub struct VectorRecord {
    pub name: String,
    pub canonical_hex: String,
}

/// Export every vector as JSON for cross-implementation checks.
pub fn export_vectors_json() -> serde_json::Result<String> {
    let records: Vec<VectorRecord> = all_vectors()
        .iter()
        .map(|vector| VectorRecord {
            name: vector.name.to_string(),
            canonical_hex: hex::encode((vector.build)()),
        })
        .collect();
    serde_json::to_string_pretty(&records)
}
