//! Metric registration and the service's recording handle.
//!
//! The registry holds the process-wide set of named instruments, created
//! once at startup. [`ServiceMetrics`] wraps it in a cheap `Clone` handle
//! and exposes the recording operations the request hooks and the system
//! sampler call.

use super::types::{
    Gauge, Histogram, HistogramData, LabeledCounter, LATENCY_BUCKETS, MEMORY_BUCKETS,
    PERCENT_BUCKETS, SIZE_BUCKETS,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Total HTTP requests, labeled by method and endpoint.
pub const REQUESTS_TOTAL: &str = "http_requests_total";
/// Request latency in seconds, labeled by method and endpoint.
pub const REQUEST_LATENCY: &str = "http_request_latency_seconds";
/// Error responses, labeled by method, endpoint and error kind.
pub const ERRORS_TOTAL: &str = "http_errors_total";
/// Resident set size in bytes.
pub const MEMORY_USAGE: &str = "memory_usage_bytes";
/// Process CPU usage percent.
pub const CPU_USAGE: &str = "cpu_usage_percent";
/// Number of OS users on the host.
pub const ACTIVE_USERS: &str = "active_users";
/// Inbound request body size in bytes.
pub const REQUEST_SIZE: &str = "http_request_size_bytes";
/// Outbound response body size in bytes.
pub const RESPONSE_SIZE: &str = "http_response_size_bytes";

/// Instrument kinds known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => write!(f, "counter"),
            Self::Gauge => write!(f, "gauge"),
            Self::Histogram => write!(f, "histogram"),
        }
    }
}

/// Registration errors. These are fatal: the process must not start with a
/// conflicting metric namespace.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("metric `{name}` already registered as a {existing}, cannot register as a {requested}")]
    DuplicateName {
        name: String,
        existing: MetricKind,
        requested: MetricKind,
    },
    #[error("metric `{name}` re-registered with a different label set")]
    LabelConflict { name: String },
}

/// Metric definition with metadata.
#[derive(Debug, Clone)]
pub struct MetricDef {
    /// Metric name (e.g., `http_requests_total`)
    pub name: String,
    /// Help text describing the metric
    pub help: String,
    /// Label names for this metric
    pub labels: Vec<String>,
}

/// Central registry for the service's metrics.
///
/// Instruments are defined once through the builder; recording happens
/// through [`ServiceMetrics`] for the process lifetime. Registering the
/// identical definition twice is idempotent; registering two instruments
/// under one name with incompatible kinds or labels fails the build.
#[derive(Debug)]
pub struct MetricRegistry {
    counters: HashMap<String, (MetricDef, LabeledCounter)>,
    histograms: HashMap<String, (MetricDef, Histogram)>,
    gauges: HashMap<String, (MetricDef, Gauge)>,
}

impl MetricRegistry {
    /// Create a new builder.
    pub fn builder() -> MetricRegistryBuilder {
        MetricRegistryBuilder::default()
    }

    /// Get a counter by name.
    pub fn counter(&self, name: &str) -> Option<&LabeledCounter> {
        self.counters.get(name).map(|(_, c)| c)
    }

    /// Get a histogram by name.
    pub fn histogram(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name).map(|(_, h)| h)
    }

    /// Get a gauge by name.
    pub fn gauge(&self, name: &str) -> Option<&Gauge> {
        self.gauges.get(name).map(|(_, g)| g)
    }

    /// Iterate over all counters with their definitions.
    pub fn counters(&self) -> impl Iterator<Item = (&MetricDef, &LabeledCounter)> {
        self.counters.values().map(|(def, c)| (def, c))
    }

    /// Iterate over all histograms with their definitions.
    pub fn histograms(&self) -> impl Iterator<Item = (&MetricDef, &Histogram)> {
        self.histograms.values().map(|(def, h)| (def, h))
    }

    /// Iterate over all gauges with their definitions.
    pub fn gauges(&self) -> impl Iterator<Item = (&MetricDef, &Gauge)> {
        self.gauges.values().map(|(def, g)| (def, g))
    }

    /// Check if a counter exists.
    pub fn has_counter(&self, name: &str) -> bool {
        self.counters.contains_key(name)
    }

    /// Check if a histogram exists.
    pub fn has_histogram(&self, name: &str) -> bool {
        self.histograms.contains_key(name)
    }

    /// Check if a gauge exists.
    pub fn has_gauge(&self, name: &str) -> bool {
        self.gauges.contains_key(name)
    }
}

/// Builder for [`MetricRegistry`].
#[derive(Default)]
pub struct MetricRegistryBuilder {
    counters: Vec<(String, Vec<String>, String)>,
    histograms: Vec<(String, Vec<String>, Vec<f64>, String)>,
    gauges: Vec<(String, String)>,
}

impl MetricRegistryBuilder {
    /// Add a counter metric.
    pub fn counter(mut self, name: &str, labels: &[&str], help: &str) -> Self {
        self.counters.push((
            name.to_string(),
            labels.iter().map(|s| s.to_string()).collect(),
            help.to_string(),
        ));
        self
    }

    /// Add a histogram metric.
    pub fn histogram(mut self, name: &str, labels: &[&str], buckets: &[f64], help: &str) -> Self {
        self.histograms.push((
            name.to_string(),
            labels.iter().map(|s| s.to_string()).collect(),
            buckets.to_vec(),
            help.to_string(),
        ));
        self
    }

    /// Add an unlabeled gauge metric.
    pub fn gauge(mut self, name: &str, help: &str) -> Self {
        self.gauges.push((name.to_string(), help.to_string()));
        self
    }

    /// Build the registry.
    ///
    /// Fails if two instruments share a name with incompatible kinds or
    /// label sets; identical re-registration is ignored.
    pub fn build(self) -> Result<MetricRegistry, MetricsError> {
        let mut kinds: HashMap<String, MetricKind> = HashMap::new();
        let mut counters = HashMap::new();
        let mut histograms = HashMap::new();
        let mut gauges = HashMap::new();

        for (name, labels, help) in self.counters {
            if let Some(&existing) = kinds.get(&name) {
                if existing != MetricKind::Counter {
                    return Err(MetricsError::DuplicateName {
                        name,
                        existing,
                        requested: MetricKind::Counter,
                    });
                }
                let same_labels = counters
                    .get(&name)
                    .map(|(def, _): &(MetricDef, LabeledCounter)| def.labels == labels)
                    .unwrap_or(false);
                if !same_labels {
                    return Err(MetricsError::LabelConflict { name });
                }
                continue;
            }
            kinds.insert(name.clone(), MetricKind::Counter);
            counters.insert(
                name.clone(),
                (MetricDef { name, help, labels }, LabeledCounter::new()),
            );
        }

        for (name, labels, buckets, help) in self.histograms {
            if let Some(&existing) = kinds.get(&name) {
                if existing != MetricKind::Histogram {
                    return Err(MetricsError::DuplicateName {
                        name,
                        existing,
                        requested: MetricKind::Histogram,
                    });
                }
                let compatible = histograms
                    .get(&name)
                    .map(|(def, hist): &(MetricDef, Histogram)| {
                        def.labels == labels && hist.buckets() == buckets.as_slice()
                    })
                    .unwrap_or(false);
                if !compatible {
                    return Err(MetricsError::LabelConflict { name });
                }
                continue;
            }
            kinds.insert(name.clone(), MetricKind::Histogram);
            histograms.insert(
                name.clone(),
                (MetricDef { name, help, labels }, Histogram::new(&buckets)),
            );
        }

        for (name, help) in self.gauges {
            if let Some(&existing) = kinds.get(&name) {
                if existing != MetricKind::Gauge {
                    return Err(MetricsError::DuplicateName {
                        name,
                        existing,
                        requested: MetricKind::Gauge,
                    });
                }
                continue;
            }
            kinds.insert(name.clone(), MetricKind::Gauge);
            gauges.insert(
                name.clone(),
                (
                    MetricDef {
                        name,
                        help,
                        labels: Vec::new(),
                    },
                    Gauge::new(),
                ),
            );
        }

        Ok(MetricRegistry {
            counters,
            histograms,
            gauges,
        })
    }
}

/// Handle to the registry for use in hooks, handlers and the sampler.
///
/// A thin wrapper around `Arc<MetricRegistry>` that names the service's
/// recording operations.
#[derive(Clone, Debug)]
pub struct ServiceMetrics {
    registry: Arc<MetricRegistry>,
}

impl ServiceMetrics {
    /// Build the registry with every instrument the service records.
    ///
    /// Called once at startup; a conflicting namespace is a fatal error.
    pub fn register() -> Result<Self, MetricsError> {
        let registry = MetricRegistry::builder()
            .counter(
                REQUESTS_TOTAL,
                &["method", "endpoint"],
                "Total number of HTTP requests received",
            )
            .histogram(
                REQUEST_LATENCY,
                &["method", "endpoint"],
                LATENCY_BUCKETS,
                "HTTP request latency in seconds",
            )
            .counter(
                ERRORS_TOTAL,
                &["method", "endpoint", "error_kind"],
                "Total number of HTTP error responses",
            )
            .histogram(
                MEMORY_USAGE,
                &[],
                MEMORY_BUCKETS,
                "Resident set size in bytes",
            )
            .histogram(CPU_USAGE, &[], PERCENT_BUCKETS, "Process CPU usage percent")
            .gauge(ACTIVE_USERS, "Number of OS users present on the host")
            .histogram(
                REQUEST_SIZE,
                &[],
                SIZE_BUCKETS,
                "HTTP request body size in bytes",
            )
            .histogram(
                RESPONSE_SIZE,
                &[],
                SIZE_BUCKETS,
                "HTTP response body size in bytes",
            )
            .build()?;

        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Wrap an existing registry (primarily for tests with custom sets).
    pub fn from_registry(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }

    /// Get the underlying registry.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Render the full exposition text.
    pub fn render(&self) -> String {
        super::prometheus::render(&self.registry)
    }

    /// Count one inbound request (pre-dispatch).
    pub fn record_request(&self, method: &str, endpoint: &str) {
        if let Some(counter) = self.registry.counter(REQUESTS_TOTAL) {
            counter.inc(&request_labels(method, endpoint));
        }
    }

    /// Observe one request latency (post-dispatch).
    pub fn observe_latency(&self, method: &str, endpoint: &str, seconds: f64) {
        if let Some(hist) = self.registry.histogram(REQUEST_LATENCY) {
            hist.observe(&request_labels(method, endpoint), seconds);
        }
    }

    /// Count one error response.
    pub fn record_error(&self, method: &str, endpoint: &str, error_kind: &str) {
        if let Some(counter) = self.registry.counter(ERRORS_TOTAL) {
            counter.inc(&error_labels(method, endpoint, error_kind));
        }
    }

    /// Observe resident memory in bytes.
    pub fn observe_memory(&self, bytes: f64) {
        if let Some(hist) = self.registry.histogram(MEMORY_USAGE) {
            hist.observe("", bytes);
        }
    }

    /// Observe process CPU percent.
    pub fn observe_cpu(&self, percent: f64) {
        if let Some(hist) = self.registry.histogram(CPU_USAGE) {
            hist.observe("", percent);
        }
    }

    /// Set the active-user gauge.
    pub fn set_active_users(&self, count: i64) {
        if let Some(gauge) = self.registry.gauge(ACTIVE_USERS) {
            gauge.set(count);
        }
    }

    /// Observe an inbound body size in bytes.
    pub fn observe_request_size(&self, bytes: f64) {
        if let Some(hist) = self.registry.histogram(REQUEST_SIZE) {
            hist.observe("", bytes);
        }
    }

    /// Observe an outbound body size in bytes.
    pub fn observe_response_size(&self, bytes: f64) {
        if let Some(hist) = self.registry.histogram(RESPONSE_SIZE) {
            hist.observe("", bytes);
        }
    }

    /// Current request count for a (method, endpoint) pair.
    pub fn request_count(&self, method: &str, endpoint: &str) -> u64 {
        self.registry
            .counter(REQUESTS_TOTAL)
            .map(|c| c.get(&request_labels(method, endpoint)))
            .unwrap_or(0)
    }

    /// Current error count for a (method, endpoint, error_kind) triple.
    pub fn error_count(&self, method: &str, endpoint: &str, error_kind: &str) -> u64 {
        self.registry
            .counter(ERRORS_TOTAL)
            .map(|c| c.get(&error_labels(method, endpoint, error_kind)))
            .unwrap_or(0)
    }

    /// Number of latency observations for a (method, endpoint) pair.
    pub fn latency_observations(&self, method: &str, endpoint: &str) -> u64 {
        let labels = request_labels(method, endpoint);
        self.registry
            .histogram(REQUEST_LATENCY)
            .map(|h| {
                h.get_all()
                    .into_iter()
                    .filter(|d: &HistogramData| d.labels == labels)
                    .map(|d| d.count)
                    .sum()
            })
            .unwrap_or(0)
    }
}

fn request_labels(method: &str, endpoint: &str) -> String {
    format!("method=\"{method}\",endpoint=\"{endpoint}\"")
}

fn error_labels(method: &str, endpoint: &str, error_kind: &str) -> String {
    format!("method=\"{method}\",endpoint=\"{endpoint}\",error_kind=\"{error_kind}\"")
}
