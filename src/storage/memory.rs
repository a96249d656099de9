use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::BlobStore;
use crate::error::{StorageError, StorageResult};

/// In-process blob store that keeps a log of every write.
///
/// Reads and writes can be switched to fail, which makes it a convenient
/// stand-in for an unreliable backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    writes: RwLock<Vec<(String, Vec<u8>)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one value already present
    pub fn with_blob(key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(key.into(), body.into());
        Self {
            blobs: RwLock::new(blobs),
            ..Self::default()
        }
    }

    /// Make subsequent reads fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every successful write, oldest first
    pub async fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.read().await.clone()
    }

    /// Current value under `key`, bypassing failure injection
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.read().await.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Connection {
                message: "memory store read failure".to_string(),
            });
        }
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, body: &[u8]) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Query {
                message: "memory store write failure".to_string(),
            });
        }
        self.blobs.write().await.insert(key.to_string(), body.to_vec());
        self.writes.write().await.push((key.to_string(), body.to_vec()));
        Ok(())
    }
}
