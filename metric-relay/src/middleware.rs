//! HTTP handler timing.
//!
//! [`HttpMetrics::handle`] wraps a request handler in an `http-server` span,
//! times it, and records the elapsed time as a `handler` timing tagged with
//! server name, method, route and status code.
//!
//! The route is reported through a [`RouteRecorder`] passed to the handler by
//! `&mut`. Handlers that know their route template should set it, since the
//! raw path is not used as a tag.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use http::{Request, Response};
//! use metric_relay::metrics::{MetricsConfig, MetricsProvider};
//! use metric_relay::middleware::HttpMetrics;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(MetricsProvider::new(MetricsConfig::new("http://localhost:9000"))?);
//! let metrics = HttpMetrics::new("api", provider);
//!
//! let request = Request::get("/users/42").body(())?;
//! let response = metrics
//!     .handle(request, |_req, route| {
//!         Box::pin(async move {
//!             route.set_route("/users/:id");
//!             Response::new("ok")
//!         })
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;
use http::{Request, Response};
use tokio::time::Instant;
use tracing::{field, info_span, Instrument};

use crate::metrics::MetricsRecorder;

/// Route used when a handler does not set one.
pub const UNKNOWN_ROUTE: &str = "unknown";

/// Lets a handler report the route template it served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecorder {
    route: String,
}

impl Default for RouteRecorder {
    fn default() -> Self {
        Self {
            route: UNKNOWN_ROUTE.to_string(),
        }
    }
}

impl RouteRecorder {
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = route.into();
    }

    pub fn route(&self) -> &str {
        &self.route
    }
}

/// Times HTTP handlers and reports them through a [`MetricsRecorder`].
#[derive(Clone)]
pub struct HttpMetrics {
    server_name: String,
    recorder: Arc<dyn MetricsRecorder>,
}

impl HttpMetrics {
    pub fn new(server_name: impl Into<String>, recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            server_name: server_name.into(),
            recorder,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Run `handler` for `request`, recording how long it took.
    pub async fn handle<B, R, F>(&self, request: Request<B>, handler: F) -> Response<R>
    where
        F: for<'r> FnOnce(Request<B>, &'r mut RouteRecorder) -> BoxFuture<'r, Response<R>>,
    {
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let span = info_span!(
            "http-server",
            otel.name = %format!("http-server {}: {} {}", self.server_name, method, path),
            server_name = %self.server_name,
            request.method = %method,
            request.path = %path,
            request.route = UNKNOWN_ROUTE,
            response.status_code = field::Empty,
        );

        let mut route = RouteRecorder::default();
        let response = handler(request, &mut route)
            .instrument(span.clone())
            .await;

        let status = response.status().as_u16();
        span.record("request.route", route.route());
        span.record("response.status_code", status);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let tags = [
            format!("server_name:{}", self.server_name),
            format!("request.method:{method}"),
            format!("request.route:{}", route.route()),
            format!("response.status_code:{status}"),
        ];
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        self.recorder
            .time_in_milliseconds("handler", elapsed_ms, &tags, 1.0);

        response
    }
}
