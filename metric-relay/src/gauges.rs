//! Gauge collection from external producers.
//!
//! A [`GaugeProducer`] reports a group of instantaneous values on demand.
//! [`emit_gauges`] polls each producer once and records every value as a
//! gauge named `gauge.<producer>.<field>`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::metrics::MetricsRecorder;

/// A single gauge reading with its tags.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedValue {
    pub value: f64,
    pub tags: Vec<String>,
}

impl TaggedValue {
    pub fn new(value: f64, tags: Vec<String>) -> Self {
        Self { value, tags }
    }
}

/// Supplies a named group of instantaneous values.
#[async_trait]
pub trait GaugeProducer: Send + Sync {
    /// Name for this group of gauges. Dashes are replaced with underscores
    /// when building metric names.
    fn gauge_name(&self) -> &str;

    /// Current values keyed by field name.
    async fn gauges(&self) -> HashMap<String, Vec<TaggedValue>>;
}

/// Poll every producer once and record its values.
pub async fn emit_gauges(recorder: &dyn MetricsRecorder, producers: &[Arc<dyn GaugeProducer>]) {
    for producer in producers {
        emit_gauge(recorder, producer.as_ref()).await;
    }
}

/// Poll one producer and record its values.
pub async fn emit_gauge(recorder: &dyn MetricsRecorder, producer: &dyn GaugeProducer) {
    let producer_name = producer.gauge_name().replace('-', "_");
    for (field, values) in producer.gauges().await {
        let scoped = format!("gauge.{producer_name}.{field}");
        for tagged in values {
            let tags: Vec<&str> = tagged.tags.iter().map(String::as_str).collect();
            trace!(name = %scoped, value = tagged.value, "Emitting gauge");
            recorder.gauge(&scoped, tagged.value, &tags, 1.0);
        }
    }
}
