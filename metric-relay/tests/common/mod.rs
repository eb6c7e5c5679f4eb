#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use metric_relay::metrics::{MetricsError, MetricsResult, Publisher, Sample};

/// Publisher double that keeps every delivered batch and can be told to
/// fail the next few attempts.
#[derive(Default)]
pub struct RecordingPublisher {
    attempts: AtomicUsize,
    failures_remaining: AtomicUsize,
    delivered: Mutex<Vec<Vec<Sample>>>,
    global_tags: Mutex<Vec<Vec<String>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, attempts: usize) {
        self.failures_remaining.store(attempts, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<Vec<Sample>> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_samples(&self) -> Vec<Sample> {
        self.delivered().into_iter().flatten().collect()
    }

    pub fn global_tags(&self) -> Vec<Vec<String>> {
        self.global_tags.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, batch: &[Sample], global_tags: &[String]) -> MetricsResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(MetricsError::ServerError {
                status: 503,
                message: "receiver unavailable".to_string(),
            });
        }

        self.delivered.lock().unwrap().push(batch.to_vec());
        self.global_tags.lock().unwrap().push(global_tags.to_vec());
        Ok(())
    }
}

/// Publisher double whose requests never complete within any sane timeout.
#[derive(Default)]
pub struct StalledPublisher {
    attempts: AtomicUsize,
}

impl StalledPublisher {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for StalledPublisher {
    async fn publish(&self, _batch: &[Sample], _global_tags: &[String]) -> MetricsResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

pub fn values(samples: &[Sample]) -> Vec<f64> {
    samples.iter().map(Sample::value).collect()
}
