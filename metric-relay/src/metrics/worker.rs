use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::metrics::{MetricsError, Publisher, SampleBuffer};

/// Statistics accumulated across publish cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub samples_published: u64,
    pub batches_sent: u64,
    pub failed_attempts: u64,
    pub consecutive_failures: u64,
    pub samples_dropped: u64,
}

/// What a single publish cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing was buffered; no request was made.
    Empty,
    /// The batch of this many samples was accepted.
    Published(usize),
    /// The batch of this many samples failed and was kept for the next cycle.
    Failed(usize),
}

/// One publish cycle: take the buffer, send it, merge it back on failure.
///
/// Cycles are serialized by `gate`, so the timer loop, explicit publishes
/// and the shutdown flush never have two batches in flight.
pub(crate) struct PublishCycle {
    buffer: SampleBuffer,
    publisher: Arc<dyn Publisher>,
    global_tags: Vec<String>,
    gate: tokio::sync::Mutex<()>,
    stats: Mutex<PublishStats>,
}

impl PublishCycle {
    pub(crate) fn new(
        buffer: SampleBuffer,
        publisher: Arc<dyn Publisher>,
        global_tags: Vec<String>,
    ) -> Self {
        Self {
            buffer,
            publisher,
            global_tags,
            gate: tokio::sync::Mutex::new(()),
            stats: Mutex::new(PublishStats::default()),
        }
    }

    pub(crate) fn stats(&self) -> PublishStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_stats(&self, f: impl FnOnce(&mut PublishStats)) {
        f(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Run one cycle. When `limit` is set the publish call is abandoned after
    /// that long and counted as a failure.
    pub(crate) async fn run(&self, limit: Option<Duration>) -> PublishOutcome {
        let _gate = self.gate.lock().await;

        let batch = self.buffer.take_and_clear();
        if batch.is_empty() {
            debug!("No samples buffered, skipping publish");
            return PublishOutcome::Empty;
        }

        let count = batch.len();
        let publish = self.publisher.publish(&batch, &self.global_tags);
        let result = match limit {
            Some(limit) => match tokio::time::timeout(limit, publish).await {
                Ok(result) => result,
                Err(_) => Err(MetricsError::Timeout { timeout: limit }),
            },
            None => publish.await,
        };

        match result {
            Ok(()) => {
                self.update_stats(|stats| {
                    stats.samples_published += count as u64;
                    stats.batches_sent += 1;
                    stats.consecutive_failures = 0;
                });
                debug!(samples = count, "Batch published");
                PublishOutcome::Published(count)
            }
            Err(e) => {
                let dropped = self.buffer.restore(batch);
                let mut consecutive = 0;
                self.update_stats(|stats| {
                    stats.failed_attempts += 1;
                    stats.consecutive_failures += 1;
                    stats.samples_dropped += dropped as u64;
                    consecutive = stats.consecutive_failures;
                });
                warn!(
                    error = %e,
                    samples = count,
                    consecutive_failures = consecutive,
                    "Publish failed, batch kept for next cycle"
                );
                if dropped > 0 {
                    warn!(dropped, "Retention cap reached, dropped oldest samples");
                }
                PublishOutcome::Failed(count)
            }
        }
    }
}

/// Background task that publishes on every tick until stopped.
pub(crate) struct PublishLoop {
    cycle: Arc<PublishCycle>,
    publish_interval: Duration,
    send_timeout: Duration,
    shutdown_timeout: Duration,
    stop: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl PublishLoop {
    pub(crate) fn new(
        cycle: Arc<PublishCycle>,
        publish_interval: Duration,
        send_timeout: Duration,
        shutdown_timeout: Duration,
        stop: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            cycle,
            publish_interval,
            send_timeout,
            shutdown_timeout,
            stop,
            cancel,
        }
    }

    /// Run until the stop signal or the cancellation token fires, then make
    /// one final publish attempt bounded by the shutdown timeout.
    ///
    /// Tick cycles are bounded by the send timeout, so a stop that arrives
    /// mid-publish waits at most `send_timeout + shutdown_timeout`.
    #[instrument(skip(self), fields(interval = ?self.publish_interval))]
    pub(crate) async fn run(mut self) {
        info!("Publish loop started");
        let mut ticker = interval_at(
            Instant::now() + self.publish_interval,
            self.publish_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("Cancellation received, flushing remaining samples");
                    break;
                }
                changed = self.stop.changed() => {
                    match changed {
                        Ok(()) if !*self.stop.borrow() => continue,
                        _ => {
                            info!("Shutdown signal received, flushing remaining samples");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.cycle.run(Some(self.send_timeout)).await;
                }
            }
        }

        let outcome = self.cycle.run(Some(self.shutdown_timeout)).await;
        let stats = self.cycle.stats();
        info!(
            final_flush = ?outcome,
            published = stats.samples_published,
            batches = stats.batches_sent,
            failed_attempts = stats.failed_attempts,
            "Publish loop stopped"
        );
    }
}
