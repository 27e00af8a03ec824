//! Route handlers and router assembly.
//!
//! Four routes plus a fallback. Each handler is a stateless
//! request/response cycle returning `Result<Json<_>, AppError>`; the
//! instrumentation hooks around them take care of counting and timing.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::metrics::{InstrumentedRouter, ServiceMetrics};
use crate::system::{HealthSnapshot, StatusSnapshot, SystemSampler};

/// Greeting returned by the root route.
pub const GREETING: &str = "Hello, World!";

/// Fixed artificial delay on the root route.
const SIMULATED_LATENCY: Duration = Duration::from_millis(100);

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub metrics: ServiceMetrics,
    pub sampler: Arc<SystemSampler>,
}

impl AppState {
    pub fn new(metrics: ServiceMetrics, sampler: Arc<SystemSampler>) -> Self {
        Self { metrics, sampler }
    }
}

/// Assemble the full application router.
///
/// Routes, fallback, state, then instrumentation, so the hooks and the
/// exposition endpoint wrap everything, the fallback included.
pub fn build_router(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    Router::new()
        .route("/", get(hello))
        .route("/health", get(health))
        .route("/api/status", get(status))
        .fallback(not_found)
        .with_state(state)
        .with_instrumentation(metrics)
}

#[derive(Debug, Serialize)]
struct GreetingResponse {
    message: &'static str,
    status: &'static str,
    timestamp: f64,
}

/// `GET /` — sample system metrics, simulate work, greet.
async fn hello(State(state): State<AppState>) -> Result<Json<GreetingResponse>> {
    state.sampler.sample(&state.metrics);
    tokio::time::sleep(SIMULATED_LATENCY).await;

    Ok(Json(GreetingResponse {
        message: GREETING,
        status: "success",
        timestamp: unix_now(),
    }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: f64,
    system: HealthSnapshot,
}

/// `GET /health` — sample system metrics, report usage percentages.
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    state.sampler.sample(&state.metrics);
    let system = state
        .sampler
        .health_snapshot()
        .map_err(AppError::unhealthy)?;

    Ok(Json(HealthResponse {
        status: "healthy",
        timestamp: unix_now(),
        system,
    }))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime: u64,
    system: StatusSnapshot,
    timestamp: f64,
}

/// `GET /api/status` — report uptime and host totals.
async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let system = state.sampler.status_snapshot().map_err(AppError::internal)?;

    Ok(Json(StatusResponse {
        status: "running",
        uptime: state.sampler.uptime(),
        system,
        timestamp: unix_now(),
    }))
}

/// Fallback for any unmatched route.
async fn not_found() -> AppError {
    AppError::not_found("Endpoint not found")
}

/// Current unix time in seconds, with sub-second precision.
fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
