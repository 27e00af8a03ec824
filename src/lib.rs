//! # Vitals
//!
//! A small instrumented HTTP service: a greeting route, Prometheus-style
//! metrics, and health/status reporting backed by host system statistics.
//!
//! ## Features
//!
//! - **Request instrumentation**: every inbound request is counted and
//!   timed by pre/post-dispatch hooks, success and failure paths alike
//! - **Prometheus exposition**: `GET /metrics` renders the registry in the
//!   standard plaintext format
//! - **Host statistics**: CPU, memory, disk and uptime via `sysinfo`,
//!   feeding both the metric distributions and the health/status routes
//! - **Uniform JSON errors**: failures convert to JSON at a single
//!   boundary; no error terminates the process
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use vitals::{build_router, AppState, ServerConfig, ServiceMetrics, SystemSampler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     vitals::logging::init(Default::default(), "info")?;
//!
//!     let config = ServerConfig::from_env();
//!     let metrics = ServiceMetrics::register()?;
//!     let sampler = Arc::new(SystemSampler::new());
//!     let app = build_router(AppState::new(metrics, sampler));
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod routes;
pub mod system;

// Re-exports
pub use config::ServerConfig;
pub use error::{AppError, ErrorKind};
pub use metrics::{InstrumentedRouter, MetricRegistry, MetricsError, ServiceMetrics};
pub use routes::{build_router, AppState};
pub use system::{SystemError, SystemSampler};
