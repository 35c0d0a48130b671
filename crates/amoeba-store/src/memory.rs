//! In-memory implementation of the BlockStore trait.
//!
//! This is primarily for testing. It has the same semantics as the file
//! store but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use amoeba_core::Key;

use crate::error::Result;
use crate::traits::{BlockStore, InsertResult};

/// In-memory block store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<Key, Bytes>>,
}

impl MemoryBlockStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn put(&self, key: &Key, block: Bytes) -> Result<InsertResult> {
        let mut blocks = self.blocks.write().unwrap();
        if blocks.contains_key(key) {
            return Ok(InsertResult::AlreadyExists);
        }
        blocks.insert(key.clone(), block);
        Ok(InsertResult::Inserted)
    }

    async fn get(&self, key: &Key) -> Result<Option<Bytes>> {
        let blocks = self.blocks.read().unwrap();
        Ok(blocks.get(key).cloned())
    }

    async fn contains(&self, key: &Key) -> Result<bool> {
        let blocks = self.blocks.read().unwrap();
        Ok(blocks.contains_key(key))
    }

    async fn remove(&self, key: &Key) -> Result<bool> {
        let mut blocks = self.blocks.write().unwrap();
        Ok(blocks.remove(key).is_some())
    }

    async fn len(&self) -> Result<usize> {
        let blocks = self.blocks.read().unwrap();
        Ok(blocks.len())
    }
}
