use std::sync::Arc;
use tracing::{error, info, warn};

use super::codec;
use super::persist::Persister;
use super::{HistoryCollection, SentimentRecord};
use crate::error::{HistoryError, HistoryResult};
use crate::storage::BlobStore;

/// Outcome of loading the history at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydration {
    /// Storage answered; `records` were loaded (zero for a new user).
    Loaded {
        /// Number of records loaded.
        records: usize,
    },
    /// Storage could not be read or decoded; the session starts empty.
    Unavailable {
        /// Why the stored history could not be used.
        reason: String,
    },
}

impl Hydration {
    /// Whether the stored history could be used.
    pub fn is_available(&self) -> bool {
        matches!(self, Hydration::Loaded { .. })
    }
}

/// Owner of the canonical history.
///
/// Every mutation rewrites the full collection to durable storage before
/// returning. Storage failures are logged and never roll back the in-memory
/// change.
pub struct RecordStore {
    records: HistoryCollection,
    store: Arc<dyn BlobStore>,
    key: String,
    persister: Persister,
}

impl RecordStore {
    /// Create an empty store mirrored to `key`. Must be called inside a tokio runtime.
    pub fn new(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let persister = Persister::spawn(store.clone(), key.clone());
        Self {
            records: Vec::new(),
            store,
            key,
            persister,
        }
    }

    /// The canonical collection, newest submission first.
    pub fn records(&self) -> &[Arc<SentimentRecord>] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load the collection from storage, replacing the in-memory one.
    ///
    /// On any failure the collection is left empty and the reason is logged
    /// and returned; nothing is written back.
    pub async fn hydrate(&mut self) -> Hydration {
        self.persister.flush().await;

        let loaded = match self.store.read(&self.key).await {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(bytes)) => codec::decode(&bytes).map_err(|e| format!("Invalid history payload: {}", e)),
            Err(e) => Err(e.to_string()),
        };

        match loaded {
            Ok(records) => {
                self.records = records.into_iter().map(Arc::new).collect();
                info!(key = %self.key, records = self.records.len(), "History loaded");
                Hydration::Loaded {
                    records: self.records.len(),
                }
            }
            Err(reason) => {
                self.records.clear();
                warn!(key = %self.key, reason = %reason, "History unavailable, starting empty");
                Hydration::Unavailable { reason }
            }
        }
    }

    /// Put `record` at the front of the collection.
    pub async fn append(&mut self, record: SentimentRecord) -> &[Arc<SentimentRecord>] {
        self.records.insert(0, Arc::new(record));
        self.persist().await;
        &self.records
    }

    /// Remove the record at `index` in canonical order.
    pub async fn remove_at(&mut self, index: usize) -> HistoryResult<&[Arc<SentimentRecord>]> {
        if index >= self.records.len() {
            return Err(HistoryError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        self.records.remove(index);
        self.persist().await;
        Ok(&self.records)
    }

    /// Remove the record with identifier `id`.
    pub async fn remove(&mut self, id: &str) -> HistoryResult<&[Arc<SentimentRecord>]> {
        let index = self
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| HistoryError::RecordNotFound { id: id.to_string() })?;
        self.records.remove(index);
        self.persist().await;
        Ok(&self.records)
    }

    /// Remove every record.
    pub async fn clear(&mut self) -> &[Arc<SentimentRecord>] {
        self.records.clear();
        self.persist().await;
        &self.records
    }

    /// Replace the whole collection, keeping the given order.
    pub async fn replace_all(&mut self, records: Vec<SentimentRecord>) -> &[Arc<SentimentRecord>] {
        self.records = records.into_iter().map(Arc::new).collect();
        self.persist().await;
        &self.records
    }

    async fn persist(&mut self) {
        match codec::encode(&self.records) {
            Ok(body) => self.persister.persist(body).await,
            Err(e) => error!(key = %self.key, error = %e, "Failed to encode history"),
        }
    }
}
