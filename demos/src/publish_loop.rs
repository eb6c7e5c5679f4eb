//! Records a handful of samples and publishes them to a receiver.
//!
//! ```text
//! METRICS_BASE_URL=http://localhost:9000 METRICS_AUTH_TOKEN=secret \
//!     cargo run -p metric-relay-demos --bin publish-loop
//! ```
//!
//! Ctrl-C cancels the governing token, which stops the loop and flushes.

use std::sync::Arc;
use std::time::Duration;

use metric_relay::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::development())?;

    let base_url =
        std::env::var("METRICS_BASE_URL").unwrap_or_else(|_| "http://localhost:9000".to_string());
    let mut config = MetricsConfig::new(base_url)
        .with_client_name("publish-loop-demo")
        .with_global_tag("service", "demo")
        .with_publish_interval(Duration::from_secs(2));
    if let Ok(token) = std::env::var("METRICS_AUTH_TOKEN") {
        config = config.with_auth_token(token);
    }

    let provider = Arc::new(MetricsProvider::new(config)?);
    let cancel = CancellationToken::new();
    provider.start(cancel.clone());

    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let http = HttpMetrics::new("demo", provider.clone());
    for i in 0..10 {
        provider.gauge("queue.depth", f64::from(i), &["region:us"], 1.0);
        provider.count("jobs.done", 1, &[], 1.0);

        let request = http::Request::get(format!("/jobs/{i}")).body(())?;
        http.handle(request, |_req, route| {
            Box::pin(async move {
                route.set_route("/jobs/:id");
                tokio::time::sleep(Duration::from_millis(20)).await;
                http::Response::new(())
            })
        })
        .await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        if cancel.is_cancelled() {
            break;
        }
    }

    if let Some(stats) = provider.close().await {
        info!(
            published = stats.samples_published,
            failed_attempts = stats.failed_attempts,
            pending = provider.pending_count(),
            "Demo finished"
        );
    }
    ctrl_c.abort();
    Ok(())
}
