//! Metrics buffering and publishing.
//!
//! Samples recorded through [`MetricsRecorder`] are appended to a
//! [`SampleBuffer`]; a background loop owned by [`MetricsProvider`] takes the
//! buffer on every tick and hands the batch to a [`Publisher`]. Batches that
//! fail to publish are merged back ahead of newer samples and retried on the
//! next tick.

mod buffer;
mod client;
mod error;
mod provider;
mod recorder;
mod types;
mod worker;

pub use buffer::SampleBuffer;
pub use client::{HttpPublisher, Publisher};
pub use error::{MetricsError, MetricsResult};
pub use provider::{MetricsProvider, ProviderState};
pub use recorder::MetricsRecorder;
pub use types::{
    MetricsConfig, PublishRequest, Sample, SampleKind, DEFAULT_CLIENT_NAME,
    DEFAULT_PUBLISH_INTERVAL, DEFAULT_REQUEST_TIMEOUT, SEND_TIMEOUT,
};
pub use worker::{PublishOutcome, PublishStats};
