//! Logging configuration for metric-relay.
//!
//! The crate itself only emits `tracing` events. Applications that do not
//! already install a subscriber can use [`init_logging`] to get plain or JSON
//! output filtered through `RUST_LOG`.

use tracing::Level;

/// Configuration for the logging setup.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the application
    pub level: Level,
    /// Log level for metric-relay components specifically
    pub relay_level: Level,
    /// Whether to use JSON output format
    pub json_format: bool,
    /// Environment filter override
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            relay_level: Level::INFO,
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Creates a configuration for production use.
    pub fn production() -> Self {
        Self {
            level: Level::WARN,
            relay_level: Level::INFO,
            json_format: true,
            env_filter: None,
        }
    }

    /// Creates a configuration for development use.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            relay_level: Level::DEBUG,
            json_format: false,
            env_filter: None,
        }
    }

    /// Sets the log level for the application.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the log level for metric-relay components.
    pub fn with_relay_level(mut self, level: Level) -> Self {
        self.relay_level = level;
        self
    }

    /// Sets whether to use JSON output format.
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    /// Sets a custom environment filter.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Builds the environment filter string.
    pub fn env_filter(&self) -> String {
        if let Some(ref filter) = self.env_filter {
            filter.clone()
        } else {
            format!(
                "{},metric_relay={}",
                self.level.as_str().to_lowercase(),
                self.relay_level.as_str().to_lowercase()
            )
        }
    }
}

/// Installs a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if a global
/// subscriber is already set.
///
/// # Examples
///
/// ```rust,no_run
/// use metric_relay::logging::{init_logging, LoggingConfig};
///
/// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
/// ```
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

    let fmt_layer = if config.json_format {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);
        assert_eq!(config.env_filter(), "info,metric_relay=info");
    }

    #[test]
    fn test_logging_config_production() {
        let config = LoggingConfig::production();
        assert!(config.json_format);
        assert_eq!(config.env_filter(), "warn,metric_relay=info");
    }

    #[test]
    fn test_env_filter_override() {
        let config = LoggingConfig::development().with_env_filter("metric_relay=trace");
        assert_eq!(config.env_filter(), "metric_relay=trace");
    }

    #[test]
    fn test_builder_levels() {
        let config = LoggingConfig::default()
            .with_level(Level::ERROR)
            .with_relay_level(Level::TRACE);
        assert_eq!(config.env_filter(), "error,metric_relay=trace");
    }
}
