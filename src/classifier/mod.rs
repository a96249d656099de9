//! Sentiment classification capability.
//!
//! The [`Classifier`] trait is the seam the analysis workflow depends on;
//! [`HttpClassifier`] is the production implementation talking to a remote
//! classification service.

mod client;
mod types;

pub use client::HttpClassifier;
pub use types::{DetectSentimentRequest, DetectSentimentResponse, WireScores};

use async_trait::async_trait;

use crate::error::ClassifierResult;
use crate::history::{SentimentLabel, SentimentScores};

/// Output of a single classification call.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Reported label.
    pub label: SentimentLabel,
    /// Reported score vector.
    pub scores: SentimentScores,
}

impl Classification {
    /// Create a classification result
    pub fn new(label: SentimentLabel, scores: SentimentScores) -> Self {
        Self { label, scores }
    }
}

/// Maps text to a sentiment label and score vector.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify already-validated, trimmed text.
    async fn classify(&self, text: &str) -> ClassifierResult<Classification>;
}
