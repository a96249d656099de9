//! Analysis workflow.
//!
//! [`AnalysisOrchestrator`] sequences one classifier call followed by an
//! append to the [`RecordStore`], and keeps the derived view in step with the
//! canonical collection. It admits one analysis at a time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::error::{AnalysisError, AnalysisResult, HistoryError};
use crate::history::{sort, HistoryCollection, Hydration, RecordStore, SentimentRecord, SortKey};

/// Progress of the current analysis, as observed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingAnalysisState {
    /// Nothing running, no error to show.
    #[default]
    Idle,
    /// A classifier call is outstanding; new submissions are rejected.
    InFlight,
    /// The last analysis failed. New submissions are accepted.
    Failed {
        /// User-visible error text.
        reason: String,
    },
}

struct HistoryState {
    store: RecordStore,
    sort_key: SortKey,
    view: HistoryCollection,
    hydration: Option<Hydration>,
}

impl HistoryState {
    fn refresh_view(&mut self) {
        self.view = sort(self.store.records(), self.sort_key);
    }
}

fn lock(state: &Mutex<PendingAnalysisState>) -> MutexGuard<'_, PendingAnalysisState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds [`PendingAnalysisState::InFlight`] for one submission.
///
/// If the submission future is dropped before it settles, the state goes back
/// to `Idle` so later submissions are not rejected as busy.
struct InFlightGuard<'a> {
    state: &'a Mutex<PendingAnalysisState>,
    settled: bool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(state: &'a Mutex<PendingAnalysisState>) -> Option<Self> {
        let mut current = lock(state);
        if *current == PendingAnalysisState::InFlight {
            return None;
        }
        *current = PendingAnalysisState::InFlight;
        Some(Self {
            state,
            settled: false,
        })
    }

    fn settle(mut self, next: PendingAnalysisState) {
        *lock(self.state) = next;
        self.settled = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut current = lock(self.state);
        if *current == PendingAnalysisState::InFlight {
            *current = PendingAnalysisState::Idle;
            warn!("Analysis abandoned before completion");
        }
    }
}

/// Coordinates classification, history mutation and the derived view.
pub struct AnalysisOrchestrator {
    classifier: Arc<dyn Classifier>,
    state: Mutex<PendingAnalysisState>,
    history: RwLock<HistoryState>,
}

impl AnalysisOrchestrator {
    /// Create an orchestrator over an injected classifier and record store
    pub fn new(classifier: Arc<dyn Classifier>, store: RecordStore) -> Self {
        let mut history = HistoryState {
            store,
            sort_key: SortKey::default(),
            view: Vec::new(),
            hydration: None,
        };
        history.refresh_view();

        Self {
            classifier,
            state: Mutex::new(PendingAnalysisState::Idle),
            history: RwLock::new(history),
        }
    }

    /// Load the stored history. Intended to run once at startup.
    pub async fn hydrate(&self) -> Hydration {
        let mut history = self.history.write().await;
        let outcome = history.store.hydrate().await;
        history.hydration = Some(outcome.clone());
        history.refresh_view();
        outcome
    }

    /// Analyze `text` and record the result.
    ///
    /// Empty or whitespace-only input fails with a validation error and leaves
    /// the state untouched. A classifier failure leaves the history untouched
    /// and moves to [`PendingAnalysisState::Failed`].
    pub async fn submit(&self, text: &str) -> AnalysisResult<SentimentRecord> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnalysisError::empty_input());
        }

        let Some(in_flight) = InFlightGuard::acquire(&self.state) else {
            warn!("Rejected submission while an analysis is in flight");
            return Err(AnalysisError::Busy);
        };

        let start = Instant::now();
        debug!(chars = text.chars().count(), "Submitting text for analysis");

        match self.classifier.classify(text).await {
            Ok(classification) => {
                let record = SentimentRecord::from_classification(text, &classification);

                let records = {
                    let mut history = self.history.write().await;
                    history.store.append(record.clone()).await;
                    history.refresh_view();
                    history.store.len()
                };

                in_flight.settle(PendingAnalysisState::Idle);

                info!(
                    record_id = %record.id(),
                    sentiment = %record.sentiment(),
                    records,
                    latency_ms = start.elapsed().as_millis(),
                    "Analysis completed"
                );
                Ok(record)
            }
            Err(e) => {
                let err = AnalysisError::from(e);
                warn!(
                    error = %err,
                    latency_ms = start.elapsed().as_millis(),
                    "Analysis failed"
                );
                in_flight.settle(PendingAnalysisState::Failed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Remove the record shown at `index` in the current view.
    ///
    /// The position is resolved to the record's identifier before deletion, so
    /// the right record goes even when the view is sorted.
    pub async fn remove_at(&self, index: usize) -> AnalysisResult<HistoryCollection> {
        let mut history = self.history.write().await;
        let id = history
            .view
            .get(index)
            .map(|r| r.id().to_string())
            .ok_or(HistoryError::IndexOutOfRange {
                index,
                len: history.view.len(),
            })?;

        history.store.remove(&id).await?;
        history.refresh_view();
        info!(record_id = %id, index, "Record removed");
        Ok(history.view.clone())
    }

    /// Remove the record with identifier `id`.
    pub async fn remove(&self, id: &str) -> AnalysisResult<HistoryCollection> {
        let mut history = self.history.write().await;
        history.store.remove(id).await?;
        history.refresh_view();
        info!(record_id = %id, "Record removed");
        Ok(history.view.clone())
    }

    /// Remove every record.
    pub async fn clear(&self) -> HistoryCollection {
        let mut history = self.history.write().await;
        history.store.clear().await;
        history.refresh_view();
        info!("History cleared");
        history.view.clone()
    }

    /// Select the ordering for the derived view and return it.
    ///
    /// The canonical collection is not reordered and nothing is persisted.
    pub async fn sort(&self, key: SortKey) -> HistoryCollection {
        let mut history = self.history.write().await;
        history.sort_key = key;
        history.refresh_view();
        debug!(sort = %key, "View reordered");
        history.view.clone()
    }

    /// The derived view under the last selected ordering.
    pub async fn view(&self) -> HistoryCollection {
        self.history.read().await.view.clone()
    }

    /// The canonical collection, newest submission first.
    pub async fn records(&self) -> HistoryCollection {
        self.history.read().await.store.records().to_vec()
    }

    /// The last selected ordering.
    pub async fn sort_key(&self) -> SortKey {
        self.history.read().await.sort_key
    }

    /// Outcome of the startup load, if it has happened.
    pub async fn hydration(&self) -> Option<Hydration> {
        self.history.read().await.hydration.clone()
    }

    /// Current analysis state.
    pub fn state(&self) -> PendingAnalysisState {
        lock(&self.state).clone()
    }

    /// Error text from the last failed analysis, cleared by the next success.
    pub fn error(&self) -> Option<String> {
        match &*lock(&self.state) {
            PendingAnalysisState::Failed { reason } => Some(reason.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classification, MockClassifier};
    use crate::error::{ClassifierError, ClassifierResult};
    use crate::history::{codec, parse_timestamp, SentimentLabel, SentimentScores};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    const KEY: &str = "sentiment-history.json";

    fn positive() -> Classification {
        Classification::new(SentimentLabel::Positive, SentimentScores::new(0.9, 0.1, 0.0, 0.0))
    }

    fn negative() -> Classification {
        Classification::new(SentimentLabel::Negative, SentimentScores::new(0.05, 0.9, 0.05, 0.0))
    }

    fn build(classifier: impl Classifier + 'static, memory: Arc<MemoryStore>) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(Arc::new(classifier), RecordStore::new(memory, KEY))
    }

    fn texts(view: &[Arc<SentimentRecord>]) -> Vec<&str> {
        view.iter().map(|r| r.text()).collect()
    }

    #[tokio::test]
    async fn test_submit_appends_and_persists() {
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .withf(|text| text.to_string() == "I love this")
            .times(1)
            .returning(|_| Ok(positive()));

        let memory = Arc::new(MemoryStore::new());
        let orchestrator = build(classifier, memory.clone());

        let record = orchestrator.submit("  I love this ").await.unwrap();

        assert_eq!(record.text(), "I love this");
        assert_eq!(record.sentiment(), SentimentLabel::Positive);
        assert_eq!(orchestrator.state(), PendingAnalysisState::Idle);

        let records = orchestrator.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(*records[0], record);

        let writes = memory.writes().await;
        assert_eq!(writes.len(), 1);
        let persisted = codec::decode(&writes[0].1).unwrap();
        assert_eq!(persisted, vec![record]);
    }

    #[tokio::test]
    async fn test_empty_submit_is_rejected_without_classifier_call() {
        let mut classifier = MockClassifier::new();
        classifier.expect_classify().never();

        let memory = Arc::new(MemoryStore::new());
        let orchestrator = build(classifier, memory.clone());

        for input in ["", "   ", "\n\t"] {
            let err = orchestrator.submit(input).await.unwrap_err();
            assert_eq!(err, AnalysisError::empty_input());
        }
        assert_eq!(orchestrator.state(), PendingAnalysisState::Idle);
        assert!(memory.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_classifier_failure_exposes_error() {
        let mut classifier = MockClassifier::new();
        classifier.expect_classify().times(1).returning(|_| {
            Err(ClassifierError::Api {
                status: 500,
                message: "API Error".to_string(),
            })
        });

        let memory = Arc::new(MemoryStore::new());
        let orchestrator = build(classifier, memory.clone());

        let err = orchestrator.submit("Test input").await.unwrap_err();

        assert!(matches!(err, AnalysisError::Classification { .. }));
        let reason = orchestrator.error().unwrap();
        assert!(reason.contains("API Error"));
        assert!(reason.starts_with("Analysis failed: "));
        assert!(orchestrator.records().await.is_empty());
        assert!(memory.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let mut classifier = MockClassifier::new();
        let mut seq = mockall::Sequence::new();
        classifier
            .expect_classify()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ClassifierError::Timeout { timeout_ms: 10 }));
        classifier
            .expect_classify()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(positive()));

        let orchestrator = build(classifier, Arc::new(MemoryStore::new()));

        assert!(orchestrator.submit("first").await.is_err());
        assert!(orchestrator.error().is_some());

        orchestrator.submit("second").await.unwrap();
        assert_eq!(orchestrator.error(), None);
        assert_eq!(orchestrator.state(), PendingAnalysisState::Idle);
    }

    struct GatedClassifier {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl Classifier for GatedClassifier {
        async fn classify(&self, _text: &str) -> ClassifierResult<Classification> {
            self.gate.notified().await;
            Ok(positive())
        }
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_in_flight() {
        let gate = Arc::new(Notify::new());
        let memory = Arc::new(MemoryStore::new());
        let orchestrator = Arc::new(build(
            GatedClassifier { gate: gate.clone() },
            memory.clone(),
        ));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit("first").await })
        };

        while orchestrator.state() != PendingAnalysisState::InFlight {
            tokio::task::yield_now().await;
        }

        assert_eq!(orchestrator.submit("second").await.unwrap_err(), AnalysisError::Busy);

        gate.notify_one();
        let record = first.await.unwrap().unwrap();

        assert_eq!(record.text(), "first");
        assert_eq!(orchestrator.records().await.len(), 1);
        assert_eq!(memory.writes().await.len(), 1);
    }

    /// Never answers its first call; answers every later one.
    struct StallsOnceClassifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Classifier for StallsOnceClassifier {
        async fn classify(&self, _text: &str) -> ClassifierResult<Classification> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok(positive())
        }
    }

    #[tokio::test]
    async fn test_abandoned_submit_releases_in_flight() {
        let memory = Arc::new(MemoryStore::new());
        let orchestrator = build(
            StallsOnceClassifier {
                calls: AtomicUsize::new(0),
            },
            memory.clone(),
        );

        let abandoned = timeout(Duration::from_millis(50), orchestrator.submit("hello")).await;
        assert!(abandoned.is_err());
        assert_eq!(orchestrator.state(), PendingAnalysisState::Idle);

        let record = orchestrator.submit("hello again").await.unwrap();
        assert_eq!(record.text(), "hello again");
        assert_eq!(orchestrator.state(), PendingAnalysisState::Idle);
        assert_eq!(texts(&orchestrator.records().await), vec!["hello again"]);
        assert_eq!(memory.writes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_view_follows_last_sort_key() {
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .returning(|text| Ok(if text.contains("bad") { negative() } else { positive() }));

        let orchestrator = build(classifier, Arc::new(MemoryStore::new()));

        orchestrator.submit("good one").await.unwrap();
        orchestrator.submit("bad one").await.unwrap();
        assert_eq!(texts(&orchestrator.view().await), vec!["bad one", "good one"]);

        let view = orchestrator.sort(SortKey::GoodToBad).await;
        assert_eq!(texts(&view), vec!["good one", "bad one"]);
        assert_eq!(texts(&orchestrator.records().await), vec!["bad one", "good one"]);

        orchestrator.submit("another bad").await.unwrap();
        assert_eq!(orchestrator.sort_key().await, SortKey::GoodToBad);
        let view = orchestrator.view().await;
        assert_eq!(view[0].text(), "good one");
        assert_eq!(view.len(), 3);
    }

    #[tokio::test]
    async fn test_remove_at_uses_view_position() {
        let bad = SentimentRecord::new("bad", SentimentLabel::Negative, negative().scores)
            .with_timestamp(parse_timestamp("2025-01-21").unwrap());
        let good = SentimentRecord::new("good", SentimentLabel::Positive, positive().scores)
            .with_timestamp(parse_timestamp("2025-01-22").unwrap());
        let payload = codec::encode(&[Arc::new(bad), Arc::new(good)]).unwrap();

        let memory = Arc::new(MemoryStore::with_blob(KEY, payload));
        let orchestrator = build(MockClassifier::new(), memory.clone());
        assert_eq!(orchestrator.hydrate().await, Hydration::Loaded { records: 2 });

        orchestrator.sort(SortKey::GoodToBad).await;
        let view = orchestrator.remove_at(0).await.unwrap();

        assert_eq!(texts(&view), vec!["bad"]);
        let persisted = codec::decode(&memory.get(KEY).await.unwrap()).unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].text(), "bad");

        let err = orchestrator.remove_at(5).await.unwrap_err();
        assert_eq!(
            err,
            AnalysisError::History(HistoryError::IndexOutOfRange { index: 5, len: 1 })
        );
    }

    #[tokio::test]
    async fn test_sort_does_not_persist() {
        let mut classifier = MockClassifier::new();
        classifier.expect_classify().returning(|_| Ok(positive()));
        let memory = Arc::new(MemoryStore::new());
        let orchestrator = build(classifier, memory.clone());

        orchestrator.submit("one").await.unwrap();
        for key in SortKey::ALL {
            orchestrator.sort(key).await;
        }

        assert_eq!(memory.writes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_and_hydrate_unavailable() {
        let memory = Arc::new(MemoryStore::with_blob(KEY, "[]"));
        memory.set_fail_reads(true);
        let orchestrator = build(MockClassifier::new(), memory.clone());

        let outcome = orchestrator.hydrate().await;
        assert!(!outcome.is_available());
        assert_eq!(orchestrator.hydration().await, Some(outcome));
        assert!(orchestrator.view().await.is_empty());

        assert!(orchestrator.clear().await.is_empty());
        assert_eq!(memory.writes().await, vec![(KEY.to_string(), b"[]".to_vec())]);
    }
}
