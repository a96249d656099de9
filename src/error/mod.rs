use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Durable store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Sentiment classification service errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClassifierError {
    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifierError::Timeout { .. } | ClassifierError::Http(_) => true,
            ClassifierError::Api { status, .. } => *status == 429 || *status >= 500,
            ClassifierError::Unavailable { .. } | ClassifierError::InvalidResponse { .. } => false,
        }
    }
}

/// Record store errors
#[derive(Debug, Error, PartialEq)]
pub enum HistoryError {
    #[error("Index {index} out of range for history of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Record not found: {id}")]
    RecordNotFound { id: String },
}

/// Errors surfaced to the user by the analysis workflow
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Analysis failed: {message}")]
    Classification { message: String },

    #[error("An analysis is already in progress")]
    Busy,

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl AnalysisError {
    /// The message shown for empty or whitespace-only input.
    pub fn empty_input() -> Self {
        AnalysisError::Validation {
            message: "Please enter valid text for analysis.".to_string(),
        }
    }
}

impl From<ClassifierError> for AnalysisError {
    fn from(err: ClassifierError) -> Self {
        AnalysisError::Classification {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for classifier operations
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Result type alias for record store operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Result type alias for the analysis workflow
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");

        let err = AppError::Internal {
            message: "unexpected".to_string(),
        };
        assert_eq!(err.to_string(), "Internal error: unexpected");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Connection {
            message: "failed to connect".to_string(),
        };
        assert_eq!(err.to_string(), "Database connection failed: failed to connect");

        let err = StorageError::Migration {
            message: "version mismatch".to_string(),
        };
        assert_eq!(err.to_string(), "Migration failed: version mismatch");
    }

    #[test]
    fn test_classifier_error_display() {
        let err = ClassifierError::Unavailable {
            message: "server down".to_string(),
            retries: 3,
        };
        assert_eq!(err.to_string(), "Classifier unavailable: server down (retries: 3)");

        let err = ClassifierError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 401 - unauthorized");

        let err = ClassifierError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");
    }

    #[test]
    fn test_classifier_error_retryable() {
        assert!(ClassifierError::Timeout { timeout_ms: 1 }.is_retryable());
        assert!(ClassifierError::Api { status: 503, message: String::new() }.is_retryable());
        assert!(ClassifierError::Api { status: 429, message: String::new() }.is_retryable());
        assert!(!ClassifierError::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!ClassifierError::InvalidResponse { message: String::new() }.is_retryable());
    }

    #[test]
    fn test_history_error_display() {
        let err = HistoryError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Index 4 out of range for history of length 2");

        let err = HistoryError::RecordNotFound {
            id: "rec-1".to_string(),
        };
        assert_eq!(err.to_string(), "Record not found: rec-1");
    }

    #[test]
    fn test_validation_message_is_unprefixed() {
        assert_eq!(
            AnalysisError::empty_input().to_string(),
            "Please enter valid text for analysis."
        );
    }

    #[test]
    fn test_classifier_error_conversion_to_analysis_error() {
        let err: AnalysisError = ClassifierError::Api {
            status: 500,
            message: "API Error".to_string(),
        }
        .into();
        assert!(matches!(err, AnalysisError::Classification { .. }));
        assert_eq!(err.to_string(), "Analysis failed: API error: 500 - API Error");
    }

    #[test]
    fn test_analysis_error_conversion_to_app_error() {
        let app_err: AppError = AnalysisError::Busy.into();
        assert!(matches!(app_err, AppError::Analysis(AnalysisError::Busy)));
        assert_eq!(app_err.to_string(), "An analysis is already in progress");
    }

    #[test]
    fn test_storage_error_conversion_to_app_error() {
        let storage_err = StorageError::Query {
            message: "locked".to_string(),
        };
        let app_err: AppError = storage_err.into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }
}
