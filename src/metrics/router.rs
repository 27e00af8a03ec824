//! Router integration.
//!
//! Extension trait wiring the lifecycle hooks and the exposition endpoint
//! onto an axum router in one call.

use super::middleware::{metrics_handler, request_hooks};
use super::registry::ServiceMetrics;
use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::get,
    Router,
};

/// Extension trait for adding request instrumentation to a router.
///
/// `with_instrumentation` attaches:
/// 1. the pre/post-dispatch metrics hooks around every route (including
///    the exposition endpoint and the 404 fallback)
/// 2. a `GET /metrics` endpoint rendering the registry
pub trait InstrumentedRouter {
    /// Instrument this router with the standard `/metrics` path.
    fn with_instrumentation(self, metrics: ServiceMetrics) -> Self;

    /// Instrument this router with a custom exposition path.
    fn with_instrumentation_at(self, metrics: ServiceMetrics, metrics_path: &str) -> Self;
}

impl<S> InstrumentedRouter for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_instrumentation(self, metrics: ServiceMetrics) -> Self {
        self.with_instrumentation_at(metrics, "/metrics")
    }

    fn with_instrumentation_at(self, metrics: ServiceMetrics, metrics_path: &str) -> Self {
        let hook_metrics = metrics.clone();

        self.route(
            metrics_path,
            get(move || metrics_handler(metrics.clone())),
        )
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            request_hooks(hook_metrics.clone(), req, next)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::middleware::UNMATCHED_ENDPOINT;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_instrumented_router_counts_and_exposes() {
        let metrics = ServiceMetrics::register().unwrap();

        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .with_instrumentation(metrics.clone());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(metrics.request_count("GET", "/ping"), 1);
        assert_eq!(metrics.latency_observations("GET", "/ping"), 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("http_requests_total{method=\"GET\",endpoint=\"/ping\"} 1"));
    }

    #[tokio::test]
    async fn test_exposition_endpoint_is_itself_instrumented() {
        let metrics = ServiceMetrics::register().unwrap();
        let app = Router::new().with_instrumentation(metrics.clone());

        app.oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(metrics.request_count("GET", "/metrics"), 1);
        assert_eq!(metrics.latency_observations("GET", "/metrics"), 1);
    }

    #[tokio::test]
    async fn test_unmatched_route_shares_one_label() {
        let metrics = ServiceMetrics::register().unwrap();
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .with_instrumentation(metrics.clone());

        for uri in ["/nope", "/scan/../etc/passwd", "/admin.php"] {
            app.clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
        }

        assert_eq!(metrics.request_count("GET", UNMATCHED_ENDPOINT), 3);
        assert_eq!(
            metrics.error_count("GET", UNMATCHED_ENDPOINT, "not_found"),
            3
        );
    }

    #[tokio::test]
    async fn test_internal_error_counted_with_latency() {
        let metrics = ServiceMetrics::register().unwrap();
        let app = Router::new()
            .route(
                "/boom",
                get(|| async { crate::error::AppError::internal("boom") }),
            )
            .with_instrumentation(metrics.clone());

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(metrics.error_count("GET", "/boom", "internal_error"), 1);
        // The failure path still gets its request count and latency observation
        assert_eq!(metrics.request_count("GET", "/boom"), 1);
        assert_eq!(metrics.latency_observations("GET", "/boom"), 1);
    }

    #[tokio::test]
    async fn test_custom_metrics_path() {
        let metrics = ServiceMetrics::register().unwrap();
        let app = Router::new().with_instrumentation_at(metrics, "/internal/metrics");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/internal/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
