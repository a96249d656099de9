//! # Sentiment History
//!
//! Submit free text, classify its sentiment through an external service, and
//! keep a durable, orderable history of past analyses.
//!
//! ## Architecture
//!
//! ```text
//! CLI → AnalysisOrchestrator → Classifier (HTTP)
//!               ↓
//!          RecordStore → Persister → BlobStore (SQLite)
//!               ↓
//!          sort(view)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sentiment_history::{AnalysisOrchestrator, Config};
//! use sentiment_history::classifier::HttpClassifier;
//! use sentiment_history::history::{RecordStore, SortKey};
//! use sentiment_history::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = Arc::new(SqliteStorage::new(&config.database).await?);
//!     let classifier = Arc::new(HttpClassifier::new(&config.classifier, config.request.clone())?);
//!     let orchestrator = AnalysisOrchestrator::new(
//!         classifier,
//!         RecordStore::new(storage, config.history.key.clone()),
//!     );
//!     orchestrator.hydrate().await;
//!     orchestrator.submit("I love this").await?;
//!     let view = orchestrator.sort(SortKey::GoodToBad).await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Analysis workflow: classification, history mutation and view state.
pub mod analysis;
/// Sentiment classifier capability and HTTP client.
pub mod classifier;
/// Command-line interface.
pub mod cli;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// History records, the record store and the sort engine.
pub mod history;
/// Durable blob storage backends.
pub mod storage;

pub use analysis::{AnalysisOrchestrator, PendingAnalysisState};
pub use config::Config;
pub use error::{AppError, AppResult};
