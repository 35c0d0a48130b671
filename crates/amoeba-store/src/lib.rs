//! # Amoeba Store
//!
//! Block persistence and presence tracking for the Amoeba content store.
//!
//! Blocks are opaque byte chunks named by their [`Key`](amoeba_core::Key).
//! The [`BlockStore`] trait abstracts where they live; [`CountCache`]
//! tracks, per erasure group, which of them are local so the fetch loop
//! knows when reconstruction can start.
//!
//! ## Key Types
//!
//! - [`BlockStore`] - Async put/get interface over content-addressed blocks
//! - [`MemoryBlockStore`] - HashMap-backed store for tests
//! - [`FileBlockStore`] - Sharded one-file-per-block store
//! - [`CountCache`] - Memoized per-group present/absent partitions

pub mod count_cache;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use count_cache::CountCache;
pub use error::{Result, StoreError};
pub use file::FileBlockStore;
pub use memory::MemoryBlockStore;
pub use traits::{BlockStore, BlockStoreExt, InsertResult};
