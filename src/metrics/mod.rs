//! Request-metrics instrumentation pipeline.
//!
//! The one part of this service with real design content:
//!
//! - [`types`]: thread-safe counter/gauge/histogram primitives
//! - [`registry`]: process-wide instrument registration and the
//!   [`ServiceMetrics`] recording handle
//! - [`prometheus`]: plaintext exposition rendering
//! - [`middleware`]: pre/post-dispatch hooks around every route
//! - [`router`]: [`InstrumentedRouter`] for wiring it all onto axum
//!
//! Instruments are registered once at startup and live for the process
//! lifetime; a conflicting namespace keeps the process from starting.

mod middleware;
mod prometheus;
mod registry;
mod router;
mod types;

// Core types
pub use registry::{
    MetricDef, MetricKind, MetricRegistry, MetricRegistryBuilder, MetricsError, ServiceMetrics,
};
pub use types::{Gauge, Histogram, HistogramData, LabeledCounter};

// Metric names
pub use registry::{
    ACTIVE_USERS, CPU_USAGE, ERRORS_TOTAL, MEMORY_USAGE, REQUESTS_TOTAL, REQUEST_LATENCY,
    REQUEST_SIZE, RESPONSE_SIZE,
};

// Bucket constants
pub use types::{LATENCY_BUCKETS, MEMORY_BUCKETS, PERCENT_BUCKETS, SIZE_BUCKETS};

// Exposition
pub use prometheus::render;

// Middleware and router
pub use middleware::{metrics_handler, normalize_path, request_hooks, UNMATCHED_ENDPOINT};
pub use router::InstrumentedRouter;
