//! End-to-end content pipeline.
//!
//! Encoding turns a payload into an [`Index`] plus content-keyed blocks;
//! fetching walks the index, pulls blocks from a store, and rebuilds the
//! payload. Readiness is gated through a [`CountCache`] so callers can poll
//! cheaply while blocks are still arriving.

use bytes::Bytes;

use amoeba_core::{
    CompressionAlgorithm, CorrectionAlgorithm, CryptoAlgorithm, Group, Index, Key,
    ValidationError,
};
use amoeba_store::{BlockStore, CountCache};

use crate::erasure;
use crate::error::{ContentError, Result};
use crate::transform::{self, ContentSecret};

/// Default size of one block in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024;
/// Default number of data blocks per group.
pub const DEFAULT_INFORMATION_LENGTH: u32 = 128;
/// Default total number of blocks per group.
pub const DEFAULT_BLOCK_LENGTH: u32 = 256;

/// Parameters controlling how a payload is cut into groups and blocks.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Size of one block in bytes.
    pub block_size: usize,
    /// Number of data blocks per group.
    pub information_length: u32,
    /// Total number of blocks per group, parity included.
    pub block_length: u32,
    /// Erasure code applied within each group.
    pub correction: CorrectionAlgorithm,
    /// Compression applied to the whole payload before chunking.
    pub compression: CompressionAlgorithm,
    /// Encryption applied after compression.
    pub crypto: CryptoAlgorithm,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            information_length: DEFAULT_INFORMATION_LENGTH,
            block_length: DEFAULT_BLOCK_LENGTH,
            correction: CorrectionAlgorithm::ReedSolomon8,
            compression: CompressionAlgorithm::Deflate,
            crypto: CryptoAlgorithm::None,
        }
    }
}

impl EncodeOptions {
    fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(ContentError::ZeroBlockSize);
        }
        let (k, n) = (self.information_length, self.block_length);
        let pass_through = self.correction == CorrectionAlgorithm::None;
        if k == 0 || k > n || (pass_through && k != n) {
            return Err(ValidationError::InvalidErasureParams { k, n }.into());
        }
        Ok(())
    }
}

/// Product of [`encode_payload`]: the index describing the layout plus every
/// block keyed by its content hash.
#[derive(Debug, Clone)]
pub struct EncodedContent {
    pub index: Index,
    pub blocks: Vec<(Key, Bytes)>,
}

/// Transforms `payload` and cuts it into erasure-coded, content-keyed blocks.
///
/// The payload is compressed and encrypted as a whole, then split into spans
/// of `information_length * block_size` bytes. Each span becomes one group of
/// `block_length` blocks; the final span is zero-padded up to the full block
/// grid while the group's `length` records how many bytes are real.
pub fn encode_payload(payload: &[u8], options: &EncodeOptions) -> Result<EncodedContent> {
    options.validate()?;
    let secret = match options.crypto {
        CryptoAlgorithm::None => None,
        CryptoAlgorithm::ChaCha20Poly1305 => Some(ContentSecret::generate()),
    };
    let transformed =
        transform::apply(payload, options.compression, options.crypto, secret.as_ref())?;

    let k = options.information_length as usize;
    let n = options.block_length as usize;
    let span = k * options.block_size;

    let mut groups = Vec::new();
    let mut blocks = Vec::new();
    for chunk in transformed.chunks(span) {
        let mut data: Vec<Vec<u8>> = Vec::with_capacity(k);
        for piece in chunk.chunks(options.block_size) {
            let mut padded = piece.to_vec();
            padded.resize(options.block_size, 0);
            data.push(padded);
        }
        data.resize(k, vec![0u8; options.block_size]);

        let coded = erasure::encode_blocks(options.correction, data, n)?;
        let keys: Vec<Key> = coded.iter().map(|block| Key::for_content(block)).collect();
        groups.push(Group::new(
            options.correction,
            options.information_length,
            options.block_length,
            chunk.len() as u64,
            keys.clone(),
        )?);
        blocks.extend(keys.into_iter().zip(coded.into_iter().map(Bytes::from)));
    }

    let index = Index::new(
        options.compression,
        options.crypto,
        secret.map(|secret| secret.to_bytes()),
        groups,
    )?;
    Ok(EncodedContent { index, blocks })
}

/// Registers `content`'s groups with the cache and writes every block.
///
/// Presence flips in the cache as each block lands, so readers polling the
/// cache see counts rise as storage progresses.
pub async fn store_content<S>(store: &S, cache: &CountCache, content: &EncodedContent) -> Result<()>
where
    S: BlockStore + ?Sized,
{
    for group in content.index.groups() {
        cache.set_group(group);
    }
    for (key, block) in &content.blocks {
        store.put(key, block.clone()).await?;
        cache.set_state(key, true);
    }
    Ok(())
}

/// Rebuilds the original payload from whatever blocks the store holds.
///
/// Every group is gated through the cache before any block is read: a group
/// short of the blocks reconstruction needs fails the call with
/// [`ContentError::InsufficientBlocks`]. Fetched blocks are verified against
/// their keys, and a corrupt block aborts the fetch.
pub async fn fetch_payload<S>(store: &S, cache: &CountCache, index: &Index) -> Result<Vec<u8>>
where
    S: BlockStore + ?Sized,
{
    for group in index.groups() {
        let have = cache.get_count(group);
        if !group.is_reconstructable(have) {
            return Err(ContentError::InsufficientBlocks {
                have,
                need: group.information_length() as usize,
            });
        }
    }

    let mut transformed = Vec::with_capacity(index.total_length() as usize);
    for group in index.groups() {
        let bytes = fetch_group(store, group).await?;
        transformed.extend_from_slice(&bytes);
    }

    let secret = match index.crypto() {
        CryptoAlgorithm::None => None,
        CryptoAlgorithm::ChaCha20Poly1305 => {
            let bytes = index.crypto_key().ok_or(ValidationError::MissingCryptoKey)?;
            Some(ContentSecret::from_bytes(bytes)?)
        }
    };
    transform::revert(
        &transformed,
        index.compression(),
        index.crypto(),
        secret.as_ref(),
    )
}

/// Fetches one group's blocks and decodes them back to payload bytes.
async fn fetch_group<S>(store: &S, group: &Group) -> Result<Vec<u8>>
where
    S: BlockStore + ?Sized,
{
    let k = group.information_length() as usize;
    let mut shards: Vec<Option<Vec<u8>>> = vec![None; group.keys().len()];
    let mut fetched = 0usize;
    for (position, key) in group.keys().iter().enumerate() {
        // Any k blocks decode the group.
        if fetched == k {
            break;
        }
        let Some(block) = store.get(key).await? else {
            continue;
        };
        if let Err(err) = key.verify_content(&block) {
            tracing::warn!("block {} failed verification: {}", key, err);
            return Err(err.into());
        }
        shards[position] = Some(block.to_vec());
        fetched += 1;
    }

    let data = erasure::reconstruct_blocks(group.correction(), shards, k)?;
    let mut bytes = data.concat();
    bytes.truncate(group.length() as usize);
    Ok(bytes)
}
