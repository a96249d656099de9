//! Analysis history: records, the canonical collection and its derived views.

pub mod codec;
mod persist;
mod record;
mod sort;
mod store;

pub use persist::Persister;
pub use record::{parse_timestamp, RecordedAt, SentimentLabel, SentimentRecord, SentimentScores};
pub use sort::{sort, SortKey};
pub use store::{Hydration, RecordStore};

use std::sync::Arc;

/// Ordered history, newest submission first. Records are shared with any
/// derived views.
pub type HistoryCollection = Vec<Arc<SentimentRecord>>;
