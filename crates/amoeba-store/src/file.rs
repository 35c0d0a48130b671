//! File-backed implementation of the BlockStore trait.
//!
//! Blocks live under `root/<first two hex chars>/<digest hex>`, one file
//! per block. The two-character shard keeps directory sizes manageable
//! for caches holding millions of blocks.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use amoeba_core::Key;

use crate::error::Result;
use crate::traits::{BlockStore, InsertResult};

/// Sharded on-disk block store.
pub struct FileBlockStore {
    root: PathBuf,
}

impl FileBlockStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn block_path(&self, key: &Key) -> PathBuf {
        let hex = key.to_hex();
        let shard = if hex.len() >= 2 { &hex[..2] } else { "00" };
        self.root.join(shard).join(&hex)
    }
}

#[async_trait]
impl BlockStore for FileBlockStore {
    async fn put(&self, key: &Key, block: Bytes) -> Result<InsertResult> {
        let path = self.block_path(key);
        if path_exists(&path).await? {
            return Ok(InsertResult::AlreadyExists);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write-then-rename: a reader never observes a torn block file.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &block).await?;
        fs::rename(&tmp, &path).await?;
        Ok(InsertResult::Inserted)
    }

    async fn get(&self, key: &Key) -> Result<Option<Bytes>> {
        match fs::read(self.block_path(key)).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn contains(&self, key: &Key) -> Result<bool> {
        path_exists(&self.block_path(key)).await
    }

    async fn remove(&self, key: &Key) -> Result<bool> {
        match fs::remove_file(self.block_path(key)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn len(&self) -> Result<usize> {
        let mut count = 0;
        let mut shards = fs::read_dir(&self.root).await?;
        while let Some(shard) = shards.next_entry().await? {
            if !shard.file_type().await?.is_dir() {
                continue;
            }
            let mut blocks = fs::read_dir(shard.path()).await?;
            while let Some(entry) = blocks.next_entry().await? {
                // Stray .tmp files from an interrupted put are not blocks.
                if entry.file_type().await?.is_file() && entry.path().extension().is_none() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

async fn path_exists(path: &Path) -> Result<bool> {
    match fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}
