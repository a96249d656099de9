//! Durable key-value blob storage.
//!
//! The history is persisted as one JSON blob under a single fixed key. Any
//! backend offering whole-value read and overwrite can host it.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Key-value blob store.
///
/// Writes overwrite the whole value (last writer wins); there is no
/// concurrency token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    async fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    /// Replace the value stored under `key`.
    async fn write(&self, key: &str, body: &[u8]) -> StorageResult<()>;
}
