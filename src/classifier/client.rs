use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{DetectSentimentRequest, DetectSentimentResponse};
use super::{Classification, Classifier};
use crate::config::{ClassifierConfig, RequestConfig};
use crate::error::{ClassifierError, ClassifierResult};

/// Upper bound on a single retry delay.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Exponential backoff for the `retry`-th attempt (1-based), capped at [`MAX_BACKOFF_MS`].
fn backoff_delay(base_ms: u64, retry: u32) -> Duration {
    let factor = 2_u64.checked_pow(retry.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// Client for a remote sentiment classification service
#[derive(Clone)]
pub struct HttpClassifier {
    client: Client,
    base_url: String,
    api_key: String,
    language_code: String,
    request_config: RequestConfig,
}

impl HttpClassifier {
    /// Create a new classifier client
    pub fn new(config: &ClassifierConfig, request_config: RequestConfig) -> ClassifierResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(ClassifierError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language_code: config.language_code.clone(),
            request_config,
        })
    }

    /// Detect sentiment, retrying transient failures with exponential backoff
    pub async fn detect_sentiment(&self, text: &str) -> ClassifierResult<Classification> {
        let url = format!("{}/v1/sentiment", self.base_url);
        let request = DetectSentimentRequest::new(text, &self.language_code);

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = backoff_delay(self.request_config.retry_delay_ms, retries);
                warn!(
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying classification request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, &request).await {
                Ok(response) => {
                    info!(
                        latency_ms = start.elapsed().as_millis(),
                        "Classification succeeded"
                    );
                    return Ok(response.into_classification());
                }
                Err(e) if !e.is_retryable() => {
                    error!(
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        "Classification failed"
                    );
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Classification attempt failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(ClassifierError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        request: &DetectSentimentRequest,
    ) -> ClassifierResult<DetectSentimentResponse> {
        debug!(
            chars = request.text.chars().count(),
            language = %request.language_code,
            "Calling classification service"
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    ClassifierError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> ClassifierResult<Classification> {
        self.detect_sentiment(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_trims_base_url() {
        let config = ClassifierConfig {
            api_key: "test_key".to_string(),
            base_url: "http://localhost:8080/".to_string(),
            language_code: "en".to_string(),
        };

        let client = HttpClassifier::new(&config, RequestConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        assert_eq!(backoff_delay(1000, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1000, 3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(1000, 64), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(u64::MAX, 200), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(0, 40), Duration::ZERO);
    }
}
