//! Single-writer persistence queue.
//!
//! Snapshots are handed to a background task over a `watch` channel. Only the
//! latest snapshot is retained, so a snapshot that has not been written yet is
//! superseded by a newer one, and at most one write is in flight at a time.
//! Each snapshot carries a generation number; callers can wait until the
//! writer has finished with their generation (successfully or not).

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::storage::BlobStore;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    generation: u64,
    body: Option<Arc<Vec<u8>>>,
}

/// Handle to the background writer for one storage key.
pub struct Persister {
    queue: watch::Sender<Snapshot>,
    settled: watch::Receiver<u64>,
    generation: u64,
}

impl Persister {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let (queue, mut pending) = watch::channel(Snapshot::default());
        let (settled_tx, settled) = watch::channel(0u64);

        tokio::spawn(async move {
            while pending.changed().await.is_ok() {
                let snapshot = pending.borrow_and_update().clone();

                if let Some(body) = snapshot.body {
                    match store.write(&key, &body).await {
                        Ok(()) => debug!(
                            key = %key,
                            generation = snapshot.generation,
                            bytes = body.len(),
                            "History persisted"
                        ),
                        Err(e) => error!(
                            key = %key,
                            generation = snapshot.generation,
                            error = %e,
                            "Failed to persist history"
                        ),
                    }
                }

                settled_tx.send_replace(snapshot.generation);
            }
            debug!(key = %key, "History writer stopped");
        });

        Self {
            queue,
            settled,
            generation: 0,
        }
    }

    /// Queue a payload without waiting. Returns its generation.
    pub fn enqueue(&mut self, body: Vec<u8>) -> u64 {
        self.generation += 1;
        self.queue.send_replace(Snapshot {
            generation: self.generation,
            body: Some(Arc::new(body)),
        });
        self.generation
    }

    /// Wait until the writer has settled `generation` or anything newer.
    pub async fn wait_for(&self, generation: u64) {
        let mut settled = self.settled.clone();
        if settled.wait_for(|done| *done >= generation).await.is_err() {
            warn!(generation, "History writer exited before the write settled");
        }
    }

    /// Queue a payload and wait for its write to settle.
    pub async fn persist(&mut self, body: Vec<u8>) {
        let generation = self.enqueue(body);
        self.wait_for(generation).await;
    }

    /// Wait for everything queued so far.
    pub async fn flush(&self) {
        self.wait_for(self.generation).await;
    }
}
