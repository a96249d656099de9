//! Derived orderings of the history.
//!
//! Sorting produces a new view sharing the same records; the canonical
//! collection is never touched and nothing is persisted.

use std::cmp::Ordering;
use std::sync::Arc;

use super::SentimentRecord;

/// Ordering applied to the derived view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Canonical order, newest analysis first.
    #[default]
    Insertion,
    /// Most positive first.
    GoodToBad,
    /// Most negative first.
    BadToGood,
    /// Oldest first.
    DateAsc,
    /// Newest first by timestamp.
    DateDesc,
}

impl SortKey {
    /// Every key, in menu order.
    pub const ALL: [SortKey; 5] = [
        SortKey::Insertion,
        SortKey::GoodToBad,
        SortKey::BadToGood,
        SortKey::DateAsc,
        SortKey::DateDesc,
    ];

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Insertion => "insertion",
            SortKey::GoodToBad => "good-to-bad",
            SortKey::BadToGood => "bad-to-good",
            SortKey::DateAsc => "date-asc",
            SortKey::DateDesc => "date-desc",
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "insertion" => Ok(SortKey::Insertion),
            "good-to-bad" => Ok(SortKey::GoodToBad),
            "bad-to-good" => Ok(SortKey::BadToGood),
            "date-asc" => Ok(SortKey::DateAsc),
            "date-desc" => Ok(SortKey::DateDesc),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

/// Produce the view of `records` under `key`.
///
/// The sort is stable: records comparing equal keep their input order.
pub fn sort(records: &[Arc<SentimentRecord>], key: SortKey) -> Vec<Arc<SentimentRecord>> {
    let mut view = records.to_vec();
    if let Some(compare) = comparator(key) {
        view.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
    }
    view
}

type Comparator = fn(&SentimentRecord, &SentimentRecord) -> Ordering;

fn comparator(key: SortKey) -> Option<Comparator> {
    match key {
        SortKey::Insertion => None,
        SortKey::GoodToBad => Some(good_to_bad),
        SortKey::BadToGood => Some(bad_to_good),
        SortKey::DateAsc => Some(date_asc),
        SortKey::DateDesc => Some(date_desc),
    }
}

// Records without a recognised timestamp sort after dated ones in both directions.
fn by_date(a: &SentimentRecord, b: &SentimentRecord, newest_first: bool) -> Ordering {
    match (a.timestamp(), b.timestamp()) {
        (Some(a), Some(b)) if newest_first => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn date_asc(a: &SentimentRecord, b: &SentimentRecord) -> Ordering {
    by_date(a, b, false)
}

fn date_desc(a: &SentimentRecord, b: &SentimentRecord) -> Ordering {
    by_date(a, b, true)
}

fn good_to_bad(a: &SentimentRecord, b: &SentimentRecord) -> Ordering {
    let (a, b) = (a.scores(), b.scores());
    b.positive
        .total_cmp(&a.positive)
        .then_with(|| b.neutral.total_cmp(&a.neutral))
        .then_with(|| a.negative.total_cmp(&b.negative))
}

fn bad_to_good(a: &SentimentRecord, b: &SentimentRecord) -> Ordering {
    let (a, b) = (a.scores(), b.scores());
    b.negative
        .total_cmp(&a.negative)
        .then_with(|| b.neutral.total_cmp(&a.neutral))
        .then_with(|| a.positive.total_cmp(&b.positive))
}
