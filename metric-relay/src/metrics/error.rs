use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while configuring or publishing metrics.
///
/// The publish loop treats every variant as a single "publish failed"
/// outcome; the distinction only matters for logging and for callers that
/// invoke a [`Publisher`](crate::metrics::Publisher) directly.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Network error (connection refused, DNS failure, reset, etc.).
    #[error("Network error: {message}")]
    Network { message: String },

    /// The receiver did not answer within the publish timeout.
    #[error("Publish timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The receiver returned a non-success status.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The batch could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Result type for metrics operations.
pub type MetricsResult<T> = std::result::Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_error_display() {
        let err = MetricsError::ServerError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (503): unavailable");

        let err = MetricsError::Timeout {
            timeout: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("10s"));
    }
}
