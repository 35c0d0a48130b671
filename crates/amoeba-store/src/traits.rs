//! BlockStore trait: the abstract interface for block persistence.
//!
//! This trait keeps the content pipeline storage-agnostic. Implementations
//! include a sharded file store (primary) and in-memory (for tests).

use async_trait::async_trait;
use bytes::Bytes;

use amoeba_core::Key;

use crate::error::Result;

/// Result of storing a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Block was stored.
    Inserted,
    /// Block already exists (idempotent, not an error).
    AlreadyExists,
}

/// The BlockStore trait: async interface for block persistence.
///
/// Blocks are content-addressed, so a key can only ever name one value
/// and re-inserting is always idempotent. There is no conflict case.
///
/// Verification is not implied: `put` stores whatever it is given. Use
/// [`BlockStoreExt::put_verified`] for blocks arriving from the network.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Store a block under its key.
    async fn put(&self, key: &Key, block: Bytes) -> Result<InsertResult>;

    /// Fetch a block.
    async fn get(&self, key: &Key) -> Result<Option<Bytes>>;

    /// Check presence without fetching the bytes.
    async fn contains(&self, key: &Key) -> Result<bool>;

    /// Drop a block. Returns whether it was held.
    async fn remove(&self, key: &Key) -> Result<bool>;

    /// Number of blocks held.
    async fn len(&self) -> Result<usize>;
}

/// Extension trait for common block store patterns.
pub trait BlockStoreExt: BlockStore {
    /// Verify a block against its key, then store it.
    ///
    /// Blocks from untrusted peers go through here; a digest mismatch is
    /// rejected before anything is written.
    fn put_verified(
        &self,
        key: &Key,
        block: Bytes,
    ) -> impl std::future::Future<Output = Result<InsertResult>> + Send;
}

impl<S: BlockStore + ?Sized> BlockStoreExt for S {
    async fn put_verified(&self, key: &Key, block: Bytes) -> Result<InsertResult> {
        if let Err(err) = key.verify_content(&block) {
            tracing::warn!("rejecting block {}: {}", key, err);
            return Err(err.into());
        }
        self.put(key, block).await
    }
}
