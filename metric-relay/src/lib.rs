//! # metric-relay - buffered metrics publishing for Rust services
//!
//! metric-relay records typed numeric samples (gauges, histograms, timings
//! and counts) from any number of concurrent call sites, batches them in
//! memory, and periodically ships each batch to a remote receiver with a
//! single `PUT /metric` request.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metric_relay::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MetricsProvider::new(
//!     MetricsConfig::new("https://metrics.example.com")
//!         .with_auth_token("secret")
//!         .with_global_tag("service", "billing"),
//! )?;
//! provider.start(CancellationToken::new());
//!
//! provider.gauge("queue.depth", 5.0, &["region:us"], 1.0);
//! provider.count("jobs.done", 3, &[], 1.0);
//!
//! provider.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Delivery guarantees
//!
//! Recording never blocks on the network and never fails. Each publish cycle
//! atomically takes the buffered samples; if the request fails the batch is
//! merged back in front of anything recorded in the meantime and retried on
//! the next tick. On [`close`](metrics::MetricsProvider::close) (or when the
//! governing cancellation token fires) the timer stops and one final publish
//! is attempted within a bounded timeout.
//!
//! Delivery is at-least-once per cycle, in memory only: nothing survives a
//! process restart.
//!
//! ## Architecture
//!
//! - **`metrics`**: samples, the buffer, the HTTP publisher and the provider
//!   that drives publish cycles
//! - **`gauges`**: polling of external gauge producers
//! - **`health`**: readiness checks for dependencies
//! - **`middleware`**: timing of HTTP handlers
//! - **`logging`**: `tracing-subscriber` setup
//! - **`security`**: secret handling for auth tokens

pub mod gauges;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod prelude;
pub mod security;
