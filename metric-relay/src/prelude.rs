//! Prelude for commonly used types and traits in metric-relay.

pub use crate::gauges::{emit_gauges, GaugeProducer, TaggedValue};
pub use crate::health::{HealthCheck, HealthCheckError, Ping, PingHealthCheck};
pub use crate::logging::{init_logging, LoggingConfig};
pub use crate::metrics::{
    MetricsConfig, MetricsError, MetricsProvider, MetricsRecorder, MetricsResult,
    PublishOutcome, PublishStats, Publisher, Sample, SampleKind,
};
pub use crate::middleware::{HttpMetrics, RouteRecorder};
