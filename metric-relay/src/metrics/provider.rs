//! MetricsProvider - buffers samples and publishes them on a timer.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use metric_relay::metrics::{MetricsConfig, MetricsProvider, MetricsRecorder};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MetricsConfig::new("https://metrics.example.com")
//!     .with_auth_token("secret")
//!     .with_global_tag("service", "billing")
//!     .with_publish_interval(Duration::from_secs(30));
//!
//! let provider = MetricsProvider::new(config)?;
//! provider.start(CancellationToken::new());
//!
//! provider.gauge("queue.depth", 5.0, &["region:us"], 1.0);
//! provider.count("jobs.done", 3, &[], 1.0);
//!
//! // Stop the timer and make one last publish attempt.
//! provider.close().await;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::recorder::owned_tags;
use crate::metrics::worker::{PublishCycle, PublishLoop};
use crate::metrics::{
    HttpPublisher, MetricsConfig, MetricsRecorder, MetricsResult, PublishOutcome, PublishStats,
    Publisher, Sample, SampleBuffer, SampleKind,
};

/// Lifecycle of a [`MetricsProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// Constructed, publish loop not started.
    Idle,
    /// Publish loop running.
    Running,
    /// Terminal. Samples recorded from here on are never published.
    Stopped,
}

enum Lifecycle {
    Idle,
    Running {
        stop_tx: watch::Sender<bool>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

/// Buffers samples from any number of callers and publishes them periodically.
///
/// ```text
///  gauge/count/...        tick / close
///        │                     │
///        ▼                     ▼
/// ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
/// │ SampleBuffer │─────▶│ PublishCycle │─────▶│  Publisher   │
/// └──────────────┘ take └──────┬───────┘      └──────────────┘
///        ▲                     │ on failure
///        └─────────────────────┘ restore
/// ```
pub struct MetricsProvider {
    config: Arc<MetricsConfig>,
    buffer: SampleBuffer,
    cycle: Arc<PublishCycle>,
    lifecycle: Mutex<Lifecycle>,
}

impl MetricsProvider {
    /// Creates a provider that publishes over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    #[instrument(skip(config), fields(base_url = %config.base_url(), client = %config.client_name()))]
    pub fn new(config: MetricsConfig) -> MetricsResult<Self> {
        let publisher = HttpPublisher::new(config.clone())?;
        info!("MetricsProvider initialized");
        Ok(Self::with_publisher(config, Arc::new(publisher)))
    }

    /// Creates a provider that hands batches to a custom publisher.
    pub fn with_publisher(config: MetricsConfig, publisher: Arc<dyn Publisher>) -> Self {
        let buffer = SampleBuffer::with_max_retained(config.max_retained_samples());
        let cycle = Arc::new(PublishCycle::new(
            buffer.clone(),
            publisher,
            config.rendered_global_tags(),
        ));

        Self {
            config: Arc::new(config),
            buffer,
            cycle,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the background publish loop.
    ///
    /// Cancelling `cancel` stops the loop on its next wake and triggers the
    /// same final flush as [`close`](Self::close). Must be called from within
    /// a Tokio runtime. Calling it when already started or stopped does
    /// nothing.
    pub fn start(&self, cancel: CancellationToken) {
        let mut lifecycle = self.lifecycle();
        if !matches!(*lifecycle, Lifecycle::Idle) {
            warn!("Publish loop already started or stopped, ignoring start");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let worker = PublishLoop::new(
            Arc::clone(&self.cycle),
            self.config.publish_interval(),
            self.config.send_timeout(),
            self.config.shutdown_timeout(),
            stop_rx,
            cancel,
        );
        let handle = tokio::spawn(worker.run());

        *lifecycle = Lifecycle::Running { stop_tx, handle };
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProviderState {
        match &*self.lifecycle() {
            Lifecycle::Idle => ProviderState::Idle,
            Lifecycle::Running { handle, .. } if handle.is_finished() => ProviderState::Stopped,
            Lifecycle::Running { .. } => ProviderState::Running,
            Lifecycle::Stopped => ProviderState::Stopped,
        }
    }

    /// Runs one publish cycle now, bounded by the send timeout.
    ///
    /// Waits for any cycle already in flight to finish first.
    pub async fn publish(&self) -> PublishOutcome {
        self.cycle.run(Some(self.config.send_timeout())).await
    }

    /// Stops the publish loop and makes one final publish attempt bounded by
    /// the shutdown timeout.
    ///
    /// A timer cycle already in flight is allowed to finish first. It is
    /// bounded by the send timeout, so this waits at most
    /// `send_timeout + shutdown_timeout`.
    ///
    /// Returns the accumulated statistics the first time it is called and
    /// `None` afterwards. Later calls never publish.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Option<PublishStats> {
        let previous = std::mem::replace(&mut *self.lifecycle(), Lifecycle::Stopped);

        match previous {
            Lifecycle::Stopped => {
                debug!("MetricsProvider already closed");
                return None;
            }
            Lifecycle::Idle => {
                info!("Closing provider that was never started, flushing once");
                self.cycle
                    .run(Some(self.config.shutdown_timeout()))
                    .await;
            }
            Lifecycle::Running { stop_tx, handle } => {
                info!("Initiating graceful shutdown");
                // The loop may already have exited after cancellation.
                let _ = stop_tx.send(true);
                if let Err(e) = handle.await {
                    error!("Publish loop task failed: {}", e);
                }
            }
        }

        let stats = self.stats();
        info!(
            published = stats.samples_published,
            pending = self.buffer.len(),
            "MetricsProvider closed"
        );
        Some(stats)
    }

    /// Number of samples waiting for the next publish.
    pub fn pending_count(&self) -> usize {
        self.buffer.len()
    }

    /// Snapshot of publish statistics.
    pub fn stats(&self) -> PublishStats {
        self.cycle.stats()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    fn record(&self, kind: SampleKind, name: &str, value: f64, tags: &[&str]) {
        self.buffer
            .append(Sample::new(kind, name, value, owned_tags(tags)));
    }
}

impl MetricsRecorder for MetricsProvider {
    fn gauge(&self, name: &str, value: f64, tags: &[&str], _rate: f64) {
        self.record(SampleKind::Gauge, name, value, tags);
    }

    fn histogram(&self, name: &str, value: f64, tags: &[&str], _rate: f64) {
        self.record(SampleKind::Histogram, name, value, tags);
    }

    fn time_in_milliseconds(&self, name: &str, value: f64, tags: &[&str], _rate: f64) {
        self.record(SampleKind::Timing, name, value, tags);
    }

    fn count(&self, name: &str, value: i64, tags: &[&str], _rate: f64) {
        self.record(SampleKind::Count, name, value as f64, tags);
    }
}
