//! Request lifecycle hooks.
//!
//! One middleware wraps every route and runs the two halves of the
//! instrumentation contract:
//!
//! - pre-dispatch: increment `http_requests_total{method, endpoint}` and
//!   observe the inbound body size
//! - post-dispatch: observe `http_request_latency_seconds` and the outbound
//!   body size, and count 404/500 responses in `http_errors_total`
//!
//! The post half runs exactly once per request whether the handler
//! succeeded or failed, so every counted request also gets exactly one
//! latency observation.

use super::registry::ServiceMetrics;
use crate::error::ErrorKind;
use axum::{
    body::HttpBody,
    extract::{MatchedPath, Request},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

/// Endpoint label shared by all requests that matched no route.
///
/// Unmatched paths are attacker-controlled strings; folding them into one
/// label value keeps metric cardinality bounded by the fixed route set.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Middleware recording request metrics around every route.
pub async fn request_hooks(metrics: ServiceMetrics, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = endpoint_label(&request);
    let request_bytes = request_body_size(&request);

    metrics.record_request(&method, &endpoint);
    metrics.observe_request_size(request_bytes);
    let start = Instant::now();

    let response = next.run(request).await;

    metrics.observe_latency(&method, &endpoint, start.elapsed().as_secs_f64());
    let response_bytes = response.body().size_hint().exact().unwrap_or(0);
    metrics.observe_response_size(response_bytes as f64);

    match response.status() {
        StatusCode::NOT_FOUND => {
            metrics.record_error(&method, &endpoint, ErrorKind::NotFound.as_label());
        }
        StatusCode::INTERNAL_SERVER_ERROR => {
            metrics.record_error(&method, &endpoint, ErrorKind::Internal.as_label());
        }
        _ => {}
    }

    response
}

/// Derive the endpoint label for a request.
///
/// Uses the matched route template when the router found one (a fixed,
/// bounded set), and [`UNMATCHED_ENDPOINT`] otherwise.
fn endpoint_label(request: &Request) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => normalize_path(matched.as_str()),
        None => UNMATCHED_ENDPOINT.to_string(),
    }
}

/// Inbound body size in bytes, from Content-Length when present.
fn request_body_size(request: &Request) -> f64 {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok())
        .or_else(|| request.body().size_hint().exact().map(|n| n as f64))
        .unwrap_or(0.0)
}

/// Normalize a path for metrics labeling.
///
/// Collapses dynamic segments so they cannot inflate cardinality:
/// UUID segments and purely numeric segments become `:id`, and trailing
/// slashes are removed (`/api/status/` and `/api/status` are one series).
pub fn normalize_path(path: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return "/".to_string();
    }

    let segments: Vec<&str> = path.split('/').collect();
    let normalized: Vec<&str> = segments
        .iter()
        .map(|seg| {
            if is_uuid(seg) || is_numeric(seg) {
                ":id"
            } else {
                *seg
            }
        })
        .collect();

    normalized.join("/")
}

/// Check if a segment looks like a UUID (8-4-4-4-12 hex pattern).
fn is_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }

    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 5 {
        return false;
    }

    let expected_lengths = [8, 4, 4, 4, 12];
    for (part, expected_len) in parts.iter().zip(expected_lengths.iter()) {
        if part.len() != *expected_len {
            return false;
        }
        if !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
    }

    true
}

/// Check if a segment is purely numeric.
fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Handler for the exposition endpoint.
pub async fn metrics_handler(metrics: ServiceMetrics) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        assert_eq!(
            normalize_path("/api/jobs/550e8400-e29b-41d4-a716-446655440000"),
            "/api/jobs/:id"
        );
        assert_eq!(
            normalize_path("/jobs/ABCDEF12-3456-7890-ABCD-EF1234567890/status"),
            "/jobs/:id/status"
        );
    }

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/users/12345/profile"), "/users/:id/profile");
        assert_eq!(normalize_path("/items/0/details"), "/items/:id/details");
    }

    #[test]
    fn test_normalize_path_trailing_slash() {
        assert_eq!(normalize_path("/api/status/"), "/api/status");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_normalize_path_no_change() {
        assert_eq!(normalize_path("/api/status"), "/api/status");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_uuid("ABCDEF12-3456-7890-ABCD-EF1234567890"));
        assert!(!is_uuid("not-a-uuid"));
        assert!(!is_uuid("550e8400-e29b-41d4-a716-44665544000"));
        assert!(!is_uuid("550e8400-e29b-41d4-a716-4466554400000"));
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("12345"));
        assert!(is_numeric("0"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("12a45"));
        assert!(!is_numeric("abc"));
    }

    #[tokio::test]
    async fn test_metrics_handler_content_type() {
        let metrics = ServiceMetrics::register().unwrap();
        metrics.record_request("GET", "/");

        let response = metrics_handler(metrics).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
