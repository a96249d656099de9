use serde::{Deserialize, Serialize};

use super::Classification;
use crate::history::{SentimentLabel, SentimentScores};

/// Request body for the sentiment detection endpoint
#[derive(Debug, Clone, Serialize)]
pub struct DetectSentimentRequest {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "LanguageCode")]
    pub language_code: String,
}

impl DetectSentimentRequest {
    /// Create a new detection request
    pub fn new(text: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language_code: language_code.into(),
        }
    }
}

/// Response from the sentiment detection endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectSentimentResponse {
    #[serde(rename = "Sentiment")]
    pub sentiment: Option<String>,
    #[serde(rename = "SentimentScore")]
    pub sentiment_score: Option<WireScores>,
}

/// Score vector as reported on the wire; every field may be absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireScores {
    #[serde(rename = "Positive")]
    pub positive: Option<f64>,
    #[serde(rename = "Negative")]
    pub negative: Option<f64>,
    #[serde(rename = "Neutral")]
    pub neutral: Option<f64>,
    #[serde(rename = "Mixed")]
    pub mixed: Option<f64>,
}

impl DetectSentimentResponse {
    /// Convert to a classification. Missing label becomes UNKNOWN, missing scores become 0.
    pub fn into_classification(self) -> Classification {
        let label = self
            .sentiment
            .as_deref()
            .map(SentimentLabel::from_label)
            .unwrap_or(SentimentLabel::Unknown);

        let wire = self.sentiment_score.unwrap_or_default();
        let scores = SentimentScores::new(
            wire.positive.unwrap_or(0.0),
            wire.negative.unwrap_or(0.0),
            wire.neutral.unwrap_or(0.0),
            wire.mixed.unwrap_or(0.0),
        );

        Classification::new(label, scores)
    }
}
