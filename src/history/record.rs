use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::classifier::Classification;

/// Closed set of sentiment labels a classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    /// Predominantly positive text.
    Positive,
    /// Predominantly negative text.
    Negative,
    /// Neither positive nor negative.
    Neutral,
    /// Both positive and negative signals.
    Mixed,
    /// Label missing or not recognised.
    Unknown,
}

impl SentimentLabel {
    /// Canonical upper-case representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::Mixed => "MIXED",
            SentimentLabel::Unknown => "UNKNOWN",
        }
    }

    /// Map any label string onto the closed set. Unrecognised input is `Unknown`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "POSITIVE" => SentimentLabel::Positive,
            "NEGATIVE" => SentimentLabel::Negative,
            "NEUTRAL" => SentimentLabel::Neutral,
            "MIXED" => SentimentLabel::Mixed,
            _ => SentimentLabel::Unknown,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for SentimentLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SentimentLabel::from_label(&raw))
    }
}

/// Four-way confidence vector. Each score lies in [0, 1]; they need not sum to 1.
///
/// Deserialization goes through [`SentimentScores::new`], so stored values are
/// clamped the same way as fresh ones. Capitalised keys and numeric strings
/// from older payloads are accepted; anything else reads as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SentimentScores {
    /// Confidence the text is positive.
    pub positive: f64,
    /// Confidence the text is negative.
    pub negative: f64,
    /// Confidence the text is neutral.
    pub neutral: f64,
    /// Confidence the text is mixed.
    pub mixed: f64,
}

impl SentimentScores {
    /// Build a score vector, clamping each value into [0, 1] (NaN becomes 0).
    pub fn new(positive: f64, negative: f64, neutral: f64, mixed: f64) -> Self {
        Self {
            positive: unit(positive),
            negative: unit(negative),
            neutral: unit(neutral),
            mixed: unit(mixed),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let score = |key: &str, legacy: &str| {
            object
                .get(key)
                .or_else(|| object.get(legacy))
                .and_then(score_value)
                .unwrap_or(0.0)
        };
        Self::new(
            score("positive", "Positive"),
            score("negative", "Negative"),
            score("neutral", "Neutral"),
            score("mixed", "Mixed"),
        )
    }
}

impl<'de> Deserialize<'de> for SentimentScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(object) => SentimentScores::from_object(&object),
            _ => SentimentScores::default(),
        })
    }
}

fn score_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// -0.0 is folded into 0.0 so equal scores compare equal under `total_cmp`.
fn unit(value: f64) -> f64 {
    if value.is_nan() || value == 0.0 {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// When an analysis completed, as stored.
///
/// Older payloads hold locale-formatted strings. Those that cannot be read
/// are kept verbatim so they survive the next write; they have no position
/// in date orderings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedAt {
    /// A recognised instant.
    At(DateTime<Utc>),
    /// An unrecognised value, written back unchanged.
    Unparsed(String),
}

impl RecordedAt {
    /// Interpret a stored timestamp string.
    pub fn parse(raw: &str) -> Self {
        match parse_timestamp(raw) {
            Some(instant) => RecordedAt::At(instant),
            None => RecordedAt::Unparsed(raw.to_string()),
        }
    }

    /// The instant, if the stored value was recognised.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordedAt::At(instant) => Some(*instant),
            RecordedAt::Unparsed(_) => None,
        }
    }

    fn from_value(value: Option<Value>) -> Self {
        match value {
            Some(Value::String(raw)) => RecordedAt::parse(&raw),
            Some(Value::Null) | None => RecordedAt::Unparsed(String::new()),
            Some(other) => RecordedAt::Unparsed(other.to_string()),
        }
    }
}

impl std::fmt::Display for RecordedAt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordedAt::At(instant) => write!(f, "{}", instant.format("%Y-%m-%d %H:%M:%S")),
            RecordedAt::Unparsed(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for RecordedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordedAt::At(instant) => serializer.serialize_str(&instant.to_rfc3339()),
            RecordedAt::Unparsed(raw) => serializer.serialize_str(raw),
        }
    }
}

/// One completed sentiment analysis.
///
/// Records are immutable once created: fields are only reachable through
/// accessors, and the builder methods consume the value before it enters a
/// collection.
///
/// Decoding a stored record only fails when `text` is missing or blank. Other
/// fields fall back: a fresh id, [`SentimentLabel::Unknown`], zero scores, or
/// a [`RecordedAt::Unparsed`] timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct SentimentRecord {
    id: String,
    text: String,
    sentiment: SentimentLabel,
    scores: SentimentScores,
    timestamp: RecordedAt,
}

fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Loose shape of a persisted record, before validation.
#[derive(Deserialize)]
struct StoredRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    text: Option<Value>,
    #[serde(default)]
    sentiment: Option<Value>,
    #[serde(default)]
    scores: Option<SentimentScores>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    date: Option<Value>,
}

impl TryFrom<StoredRecord> for SentimentRecord {
    type Error = String;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let text = match stored.text {
            Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Some(Value::String(_)) => return Err("record text is blank".to_string()),
            _ => return Err("record has no text".to_string()),
        };

        let id = match stored.id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(n)) => n.to_string(),
            _ => new_record_id(),
        };

        let sentiment = match stored.sentiment {
            Some(Value::String(label)) => SentimentLabel::from_label(&label),
            _ => SentimentLabel::Unknown,
        };

        Ok(Self {
            id,
            text,
            sentiment,
            scores: stored.scores.unwrap_or_default(),
            timestamp: RecordedAt::from_value(stored.timestamp.or(stored.date)),
        })
    }
}

impl SentimentRecord {
    /// Create a record stamped with the current time. The text is stored trimmed.
    pub fn new(text: impl AsRef<str>, sentiment: SentimentLabel, scores: SentimentScores) -> Self {
        Self {
            id: new_record_id(),
            text: text.as_ref().trim().to_string(),
            sentiment,
            scores,
            timestamp: RecordedAt::At(Utc::now()),
        }
    }

    /// Create a record from a classifier result.
    pub fn from_classification(text: impl AsRef<str>, classification: &Classification) -> Self {
        Self::new(text, classification.label, classification.scores)
    }

    /// Override the creation timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = RecordedAt::At(timestamp);
        self
    }

    /// Override the identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Stable opaque identifier assigned at creation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The analyzed input text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The reported label.
    pub fn sentiment(&self) -> SentimentLabel {
        self.sentiment
    }

    /// The reported score vector.
    pub fn scores(&self) -> &SentimentScores {
        &self.scores
    }

    /// When the analysis completed, or `None` if the stored value was not recognised.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.instant()
    }

    /// The timestamp as stored.
    pub fn recorded_at(&self) -> &RecordedAt {
        &self.timestamp
    }
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.f]` and the en-US locale
/// form `M/D/YYYY, h:mm:ss AM`. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // Locale output may use no-break spaces before the AM/PM marker.
    let normalized = raw.replace(['\u{202f}', '\u{a0}'], " ");
    let raw = normalized.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%m/%d/%Y, %I:%M:%S %p", "%m/%d/%Y, %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
