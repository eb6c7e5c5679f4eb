//! Readiness checks for dependencies.
//!
//! Health checks are independent of the metrics engine. A failing check is
//! reported to the caller as a [`HealthCheckError`] wrapping the cause; retry
//! policy belongs to whatever polls readiness.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Boxed error returned by a [`Ping`] implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Timeout applied to a single ping.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors reported by health checks.
#[derive(Debug, Error)]
pub enum HealthCheckError {
    /// The dependency answered with an error.
    #[error("{name} health check failed on ping: {source}")]
    Failed { name: String, source: BoxError },

    /// The dependency did not answer in time.
    #[error("{name} health check failed on ping: timed out after {timeout:?}")]
    TimedOut { name: String, timeout: Duration },
}

/// A named readiness probe.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `Ok(())` when the dependency is ready to serve traffic.
    async fn ready(&self) -> Result<(), HealthCheckError>;
}

/// A dependency that can be pinged, such as a database client.
#[async_trait]
pub trait Ping: Send + Sync {
    async fn ping(&self) -> Result<(), BoxError>;
}

/// Readiness check that pings a dependency with its own timeout.
pub struct PingHealthCheck<P> {
    name: String,
    pinger: P,
    timeout: Duration,
}

impl<P: Ping> PingHealthCheck<P> {
    pub fn new(name: impl Into<String>, pinger: P) -> Self {
        Self {
            name: name.into(),
            pinger,
            timeout: DEFAULT_PING_TIMEOUT,
        }
    }

    /// Override the ping timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl<P: Ping> HealthCheck for PingHealthCheck<P> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(check = %self.name))]
    async fn ready(&self) -> Result<(), HealthCheckError> {
        match tokio::time::timeout(self.timeout, self.pinger.ping()).await {
            Ok(Ok(())) => {
                debug!("Health check passed");
                Ok(())
            }
            Ok(Err(source)) => {
                warn!(error = %source, "Health check failed");
                Err(HealthCheckError::Failed {
                    name: self.name.clone(),
                    source,
                })
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Health check timed out");
                Err(HealthCheckError::TimedOut {
                    name: self.name.clone(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    struct StaticPing(Option<&'static str>);

    #[async_trait]
    impl Ping for StaticPing {
        async fn ping(&self) -> Result<(), BoxError> {
            match self.0 {
                None => Ok(()),
                Some(message) => Err(message.into()),
            }
        }
    }

    struct HangingPing;

    #[async_trait]
    impl Ping for HangingPing {
        async fn ping(&self) -> Result<(), BoxError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_ping_success() {
        let check = PingHealthCheck::new("mongo", StaticPing(None));
        assert_eq!(check.name(), "mongo");
        assert!(check.ready().await.is_ok());
    }

    #[tokio::test]
    async fn test_ping_failure_wraps_cause() {
        let check = PingHealthCheck::new("mongo", StaticPing(Some("no reachable servers")));

        let err = check.ready().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "mongo health check failed on ping: no reachable servers"
        );
        assert!(err.source().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_times_out() {
        let check = PingHealthCheck::new("postgres", HangingPing);

        let err = check.ready().await.unwrap_err();
        assert!(matches!(
            err,
            HealthCheckError::TimedOut { timeout, .. } if timeout == DEFAULT_PING_TIMEOUT
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timeout() {
        let check =
            PingHealthCheck::new("postgres", HangingPing).with_timeout(Duration::from_millis(10));
        let started = tokio::time::Instant::now();

        assert!(check.ready().await.is_err());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
