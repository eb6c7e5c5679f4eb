use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::{MetricsError, MetricsResult};
use crate::security::SecureString;

/// Client name used when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = "http-metrics-client";

/// Publish interval used when none (or zero) is configured.
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(60);

/// Default timeout for ordinary requests made by the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(500);

/// Timeout for a single publish request. Payloads grow with the number of
/// accumulated samples, so this is deliberately longer than the default.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for publishing metrics to a receiver.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    base_url: String,
    auth_token: Option<SecureString>,
    global_tags: BTreeMap<String, String>,
    client_name: String,
    publish_interval: Duration,
    request_timeout: Duration,
    send_timeout: Duration,
    shutdown_timeout: Duration,
    max_retained_samples: Option<usize>,
}

impl MetricsConfig {
    /// Create a new MetricsConfig publishing to the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            global_tags: BTreeMap::new(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            send_timeout: SEND_TIMEOUT,
            shutdown_timeout: SEND_TIMEOUT,
            max_retained_samples: None,
        }
    }

    /// Set the bearer token sent with every publish request.
    ///
    /// An empty token is treated as no token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = SecureString::new(token.into());
        self.auth_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Add a single global tag, rendered as `key:value` on every publish.
    pub fn with_global_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.global_tags.insert(key.into(), value.into());
        self
    }

    /// Add several global tags at once.
    pub fn with_global_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.global_tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the client name used for logging and the user agent.
    ///
    /// An empty name keeps the default.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.client_name = name;
        }
        self
    }

    /// Set how often buffered samples are published. Zero keeps the default.
    pub fn with_publish_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.publish_interval = interval;
        }
        self
    }

    /// Set the default timeout for requests made by the HTTP client.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the timeout for a single publish request.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the upper bound for the final flush performed on shutdown.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Cap the number of samples kept after failed publishes.
    ///
    /// When a failed batch is merged back and the buffer would exceed this
    /// size, the oldest samples are dropped.
    pub fn with_max_retained_samples(mut self, max: usize) -> Self {
        self.max_retained_samples = Some(max);
        self
    }

    /// Get the receiver base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the auth token.
    ///
    /// # Security
    /// Returns a reference to the secure string. Use `expose()` to access
    /// the underlying value. Avoid storing or logging the exposed value.
    pub fn auth_token(&self) -> Option<&SecureString> {
        self.auth_token.as_ref()
    }

    /// Get the global tags as configured.
    pub fn global_tags(&self) -> &BTreeMap<String, String> {
        &self.global_tags
    }

    /// Global tags rendered as `key:value`, ordered by key.
    pub fn rendered_global_tags(&self) -> Vec<String> {
        self.global_tags
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect()
    }

    /// Get the client name.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// User agent sent with every request.
    pub fn user_agent(&self) -> String {
        format!("{}, metric-relay", self.client_name)
    }

    /// Get the publish interval.
    pub fn publish_interval(&self) -> Duration {
        self.publish_interval
    }

    /// Get the default request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Get the publish request timeout.
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Get the shutdown flush timeout.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Get the retained sample cap, if any.
    pub fn max_retained_samples(&self) -> Option<usize> {
        self.max_retained_samples
    }

    /// Check that the configuration can be used to build a publisher.
    pub fn validate(&self) -> MetricsResult<()> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| MetricsError::Configuration {
            message: format!("Invalid base URL '{}': {e}", self.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MetricsError::Configuration {
                message: format!("Unsupported URL scheme '{}'", url.scheme()),
            });
        }
        if self.request_timeout.is_zero()
            || self.send_timeout.is_zero()
            || self.shutdown_timeout.is_zero()
        {
            return Err(MetricsError::Configuration {
                message: "Timeouts must be greater than zero".to_string(),
            });
        }
        if self.max_retained_samples == Some(0) {
            return Err(MetricsError::Configuration {
                message: "max_retained_samples must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// The kind of a recorded sample.
///
/// Purely descriptive: every kind is stored and transmitted the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    #[serde(rename = "gauge")]
    Gauge,
    #[serde(rename = "histogram")]
    Histogram,
    #[serde(rename = "timeInMilliseconds")]
    Timing,
    #[serde(rename = "count")]
    Count,
}

impl SampleKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Gauge => "gauge",
            SampleKind::Histogram => "histogram",
            SampleKind::Timing => "timeInMilliseconds",
            SampleKind::Count => "count",
        }
    }
}

impl std::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded metric emission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "type")]
    kind: SampleKind,
    name: String,
    value: f64,
    tags: Vec<String>,
}

impl Sample {
    pub fn new(kind: SampleKind, name: impl Into<String>, value: f64, tags: Vec<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value,
            tags,
        }
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Body of a publish request.
#[derive(Debug, Serialize)]
pub struct PublishRequest<'a> {
    pub metrics: &'a [Sample],
    pub tags: &'a [String],
}
