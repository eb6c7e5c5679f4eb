use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::metrics::{MetricsConfig, MetricsError, MetricsResult, PublishRequest, Sample};

/// Something that can ship a batch of samples to a receiver.
///
/// Implementations must treat an empty batch as a no-op.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Send `batch` together with the process-wide `global_tags`.
    async fn publish(&self, batch: &[Sample], global_tags: &[String]) -> MetricsResult<()>;
}

/// Publishes batches with a single `PUT /metric` request.
#[derive(Clone)]
pub struct HttpPublisher {
    config: Arc<MetricsConfig>,
    client: Client,
    endpoint: String,
}

impl HttpPublisher {
    /// Create a new publisher with the given configuration.
    pub fn new(config: MetricsConfig) -> MetricsResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = config.auth_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .map_err(|_| MetricsError::Configuration {
                    message: "Auth token contains characters not allowed in a header".to_string(),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| MetricsError::Configuration {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        let endpoint = format!("{}/metric", config.base_url().trim_end_matches('/'));

        Ok(Self {
            config: Arc::new(config),
            client,
            endpoint,
        })
    }

    /// Full URL batches are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the configuration.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    fn map_send_error(&self, e: reqwest::Error) -> MetricsError {
        if e.is_timeout() {
            MetricsError::Timeout {
                timeout: self.config.send_timeout(),
            }
        } else {
            MetricsError::Network {
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    #[instrument(skip_all, fields(client = %self.config.client_name(), samples = batch.len()))]
    async fn publish(&self, batch: &[Sample], global_tags: &[String]) -> MetricsResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let body = serde_json::to_vec(&PublishRequest {
            metrics: batch,
            tags: global_tags,
        })
        .map_err(|e| MetricsError::Serialization {
            message: e.to_string(),
        })?;

        let response = self
            .client
            .put(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.config.send_timeout())
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Batch accepted");
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(MetricsError::ServerError {
            status: status.as_u16(),
            message,
        })
    }
}
