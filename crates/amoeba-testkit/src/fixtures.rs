//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use rand::RngCore;

use amoeba_content::{encode_payload, store_content, EncodeOptions, EncodedContent};
use amoeba_core::{
    CorrectionAlgorithm, Group, Key, Keypair, Seed, SeedBox, SeedBoxBuilder, SeedBuilder,
};
use amoeba_store::{CountCache, MemoryBlockStore};

/// A test fixture with a keypair, a block store, and a count cache.
pub struct TestFixture {
    pub keypair: Keypair,
    pub store: MemoryBlockStore,
    pub cache: CountCache,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
            store: MemoryBlockStore::new(),
            cache: CountCache::new(),
        }
    }

    /// Create with a deterministic keypair from seed material.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
            store: MemoryBlockStore::new(),
            cache: CountCache::new(),
        }
    }

    /// Get the keypair's public key.
    pub fn public_key(&self) -> amoeba_core::Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// Create a content key from a label, distinct per label.
    pub fn make_key(&self, label: &str) -> Key {
        Key::for_content(label.as_bytes())
    }

    /// Create a signed seed naming `payload`.
    pub fn make_seed(&self, name: &str, payload: &[u8]) -> Seed {
        SeedBuilder::new(name)
            .length(payload.len() as u64)
            .creation_time(now_millis())
            .key(Key::for_content(payload))
            .sign(&self.keypair)
            .expect("fixture seed fields are within limits")
    }

    /// Create a group whose keys name the given blocks, without parity.
    pub fn make_group(&self, blocks: &[&[u8]]) -> Group {
        let keys = blocks.iter().map(|block| Key::for_content(block)).collect();
        let length = blocks.iter().map(|block| block.len() as u64).sum();
        let count = blocks.len() as u32;
        Group::new(CorrectionAlgorithm::None, count, count, length, keys)
            .expect("block list forms a valid group")
    }

    /// Build a chain of boxes nested `depth` levels deep, the innermost
    /// level holding one signed seed.
    pub fn deep_box(&self, depth: usize) -> SeedBox {
        let mut node = SeedBoxBuilder::new("leaf")
            .add_seed(self.make_seed("inner.bin", b"innermost payload"))
            .build()
            .expect("fixture box fields are within limits");
        for level in 1..depth {
            node = SeedBoxBuilder::new(format!("level-{level}"))
                .add_box(node)
                .build()
                .expect("fixture box fields are within limits");
        }
        node
    }

    /// Encode `payload` and store every block, flipping presence as it lands.
    pub async fn store_payload(&self, payload: &[u8], options: &EncodeOptions) -> EncodedContent {
        let content = encode_payload(payload, options).expect("fixture options are valid");
        store_content(&self.store, &self.cache, &content)
            .await
            .expect("memory store does not fail");
        content
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}

/// Random bytes standing in for content.
pub fn random_payload(len: usize) -> Vec<u8> {
    let mut payload = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut payload);
    payload
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
