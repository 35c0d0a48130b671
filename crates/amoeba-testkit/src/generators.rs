//! Proptest generators for property-based testing.

use proptest::prelude::*;

use amoeba_core::{
    CorrectionAlgorithm, Group, HashAlgorithm, Key, Keypair, Seed, SeedBuilder, MAX_DIGEST_LEN,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a key with any allowed digest length.
pub fn key() -> impl Strategy<Value = Key> {
    prop::collection::vec(any::<u8>(), 0..=MAX_DIGEST_LEN)
        .prop_map(|digest| Key::new(HashAlgorithm::Blake3, digest).expect("digest fits"))
}

/// Generate a key naming actual content.
pub fn content_key() -> impl Strategy<Value = Key> {
    payload(64).prop_map(|bytes| Key::for_content(&bytes))
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a file-like name.
pub fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.-]{0,31}".prop_map(String::from)
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=1_800_000_000_000i64
}

/// Generate erasure parameters with data count no greater than total.
pub fn erasure_params() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=16).prop_flat_map(|k| (Just(k), k..=32u32))
}

/// Parameters for generating a group.
#[derive(Debug, Clone)]
pub struct GroupParams {
    pub correction: CorrectionAlgorithm,
    pub information_length: u32,
    pub block_length: u32,
    pub length: u64,
    pub salt: u8,
}

impl Arbitrary for GroupParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<bool>(),
            1u32..=16,       // data blocks
            0u32..=16,       // extra parity blocks
            0u64..=1 << 40,  // group payload length
            any::<u8>(),
        )
            .prop_map(|(coded, k, extra, length, salt)| {
                let correction = if coded {
                    CorrectionAlgorithm::ReedSolomon8
                } else {
                    CorrectionAlgorithm::None
                };
                let n = if coded { k + extra } else { k };
                GroupParams {
                    correction,
                    information_length: k,
                    block_length: n,
                    length,
                    salt,
                }
            })
            .boxed()
    }
}

/// Generate a group from parameters, with keys derived from the salt.
pub fn group_from_params(params: &GroupParams) -> Group {
    let keys = (0..params.block_length)
        .map(|position| Key::for_content(&[params.salt, position as u8]))
        .collect();
    Group::new(
        params.correction,
        params.information_length,
        params.block_length,
        params.length,
        keys,
    )
    .expect("generated parameters are valid")
}

/// Parameters for generating a signed seed.
#[derive(Debug, Clone)]
pub struct SeedParams {
    pub signing_seed: [u8; 32],
    pub name: String,
    pub length: u64,
    pub creation_time: i64,
    pub keywords: Vec<String>,
    pub comment: String,
    pub rank: u32,
    pub payload: Vec<u8>,
}

impl Arbitrary for SeedParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            name(),
            any::<u64>(),
            timestamp(),
            prop::collection::vec(name(), 0..4),
            ".{0,64}",
            any::<u32>(),
            payload(128),
        )
            .prop_map(
                |(signing_seed, name, length, creation_time, keywords, comment, rank, payload)| {
                    SeedParams {
                        signing_seed,
                        name,
                        length,
                        creation_time,
                        keywords,
                        comment,
                        rank,
                        payload,
                    }
                },
            )
            .boxed()
    }
}

/// Generate a signed seed from parameters.
pub fn seed_from_params(params: &SeedParams) -> Seed {
    let keypair = Keypair::from_seed(&params.signing_seed);

    let mut builder = SeedBuilder::new(params.name.clone())
        .length(params.length)
        .creation_time(params.creation_time)
        .comment(params.comment.clone())
        .rank(params.rank)
        .key(Key::for_content(&params.payload));

    for keyword in &params.keywords {
        builder = builder.keyword(keyword.clone());
    }

    builder
        .sign(&keypair)
        .expect("generated parameters are within limits")
}
