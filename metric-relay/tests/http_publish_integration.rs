use std::time::Duration;

use metric_relay::metrics::{
    HttpPublisher, MetricsConfig, MetricsError, MetricsProvider, MetricsRecorder, PublishOutcome,
    Publisher, Sample, SampleKind,
};
use mockito::Matcher;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn config_for(server: &mockito::ServerGuard) -> MetricsConfig {
    MetricsConfig::new(server.url())
        .with_auth_token("test-token")
        .with_client_name("billing-api")
        .with_global_tag("service", "billing")
        .with_global_tag("env", "test")
}

#[tokio::test]
async fn test_publish_wire_format() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/metric")
        .match_header("authorization", "Bearer test-token")
        .match_header("user-agent", "billing-api, metric-relay")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "metrics": [
                {"type": "gauge", "name": "queue.depth", "value": 5.0, "tags": ["region:us"]},
                {"type": "timeInMilliseconds", "name": "handler", "value": 12.5, "tags": []},
            ],
            "tags": ["env:test", "service:billing"],
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let provider = MetricsProvider::new(config_for(&server)).expect("valid config");
    provider.gauge("queue.depth", 5.0, &["region:us"], 1.0);
    provider.time_in_milliseconds("handler", 12.5, &[], 1.0);

    assert_eq!(provider.publish().await, PublishOutcome::Published(2));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_auth_header_without_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/metric")
        .match_header("authorization", Matcher::Missing)
        .with_status(202)
        .expect(1)
        .create_async()
        .await;

    let provider = MetricsProvider::new(MetricsConfig::new(server.url())).unwrap();
    provider.count("jobs.done", 1, &[], 1.0);

    assert_eq!(provider.publish().await, PublishOutcome::Published(1));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_cycle_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/metric")
        .expect(0)
        .create_async()
        .await;

    let provider = MetricsProvider::new(config_for(&server)).unwrap();
    assert_eq!(provider.publish().await, PublishOutcome::Empty);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_retains_batch_until_next_success() {
    let mut server = mockito::Server::new_async().await;
    let failing = server
        .mock("PUT", "/metric")
        .with_status(500)
        .with_body("database unavailable")
        .expect(1)
        .create_async()
        .await;

    let provider = MetricsProvider::new(config_for(&server)).unwrap();
    provider.gauge("queue.depth", 5.0, &["region:us"], 1.0);
    provider.count("jobs.done", 3, &[], 1.0);

    assert_eq!(provider.publish().await, PublishOutcome::Failed(2));
    assert_eq!(provider.pending_count(), 2);
    failing.assert_async().await;
    failing.remove_async().await;

    provider.count("jobs.done", 1, &[], 1.0);

    let accepting = server
        .mock("PUT", "/metric")
        .match_body(Matcher::Json(json!({
            "metrics": [
                {"type": "gauge", "name": "queue.depth", "value": 5.0, "tags": ["region:us"]},
                {"type": "count", "name": "jobs.done", "value": 3.0, "tags": []},
                {"type": "count", "name": "jobs.done", "value": 1.0, "tags": []},
            ],
            "tags": ["env:test", "service:billing"],
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    assert_eq!(provider.publish().await, PublishOutcome::Published(3));
    assert_eq!(provider.pending_count(), 0);
    accepting.assert_async().await;
}

#[tokio::test]
async fn test_publisher_reports_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/metric")
        .with_status(503)
        .with_body("try later")
        .create_async()
        .await;

    let publisher = HttpPublisher::new(MetricsConfig::new(server.url())).unwrap();
    let batch = vec![Sample::new(SampleKind::Count, "jobs.done", 1.0, vec![])];

    match publisher.publish(&batch, &[]).await {
        Err(MetricsError::ServerError { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "try later");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timer_publishes_and_close_flushes() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/metric")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;

    let provider = MetricsProvider::new(
        config_for(&server).with_publish_interval(Duration::from_millis(50)),
    )
    .unwrap();
    provider.start(CancellationToken::new());

    provider.count("jobs.done", 1, &[], 1.0);
    for _ in 0..200 {
        if provider.stats().batches_sent == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(provider.stats().batches_sent, 1);

    provider.count("jobs.done", 2, &[], 1.0);
    let stats = provider.close().await.unwrap();
    assert_eq!(stats.batches_sent, 2);
    assert_eq!(stats.samples_published, 2);

    assert!(provider.close().await.is_none());
    mock.assert_async().await;
}
