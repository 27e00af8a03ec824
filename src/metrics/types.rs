//! Core metric instruments: counter, gauge, histogram.
//!
//! Thread-safe primitives built on atomics behind `parking_lot::RwLock` maps.
//! Every instrument is safe for concurrent mutation from simultaneously
//! handled requests; increments are never lost.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Thread-safe monotonic counter keyed by a label combination.
///
/// Labels are pre-formatted as `key1="value1",key2="value2"`.
#[derive(Debug, Default)]
pub struct LabeledCounter {
    values: RwLock<HashMap<String, AtomicU64>>,
}

impl LabeledCounter {
    /// Create a new labeled counter.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Increment counter by 1 for the given label combination.
    pub fn inc(&self, labels: &str) {
        self.add(labels, 1);
    }

    /// Add value to counter for the given label combination.
    pub fn add(&self, labels: &str, value: u64) {
        // Fast path: series already exists
        {
            let values = self.values.read();
            if let Some(counter) = values.get(labels) {
                counter.fetch_add(value, Ordering::Relaxed);
                return;
            }
        }

        // Slow path: first observation for this series
        let mut values = self.values.write();
        values
            .entry(labels.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Get current value for the given label combination.
    pub fn get(&self, labels: &str) -> u64 {
        let values = self.values.read();
        values
            .get(labels)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Get all label/value pairs.
    pub fn get_all(&self) -> Vec<(String, u64)> {
        let values = self.values.read();
        values
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Thread-safe point-in-time gauge.
///
/// The only gauge in this service (`active_users`) carries no labels, so
/// the type holds a single value. A gauge that was never set is omitted
/// from exposition output.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
    touched: AtomicBool,
}

impl Gauge {
    /// Create a new gauge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gauge to a specific value.
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
        self.touched.store(true, Ordering::Release);
    }

    /// Get the current value.
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Whether the gauge has been set at least once.
    pub fn is_set(&self) -> bool {
        self.touched.load(Ordering::Acquire)
    }
}

/// Thread-safe histogram with fixed bucket boundaries.
///
/// Tracks cumulative bucket counts plus sum and count per label
/// combination. Series with no labels use the empty label string.
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<f64>,
    counts: RwLock<HashMap<String, Vec<AtomicU64>>>,
    sums: RwLock<HashMap<String, f64>>,
    totals: RwLock<HashMap<String, u64>>,
}

impl Histogram {
    /// Create a new histogram with the given bucket boundaries.
    ///
    /// Bucket boundaries must be sorted in ascending order.
    pub fn new(buckets: &[f64]) -> Self {
        Self {
            buckets: buckets.to_vec(),
            counts: RwLock::new(HashMap::new()),
            sums: RwLock::new(HashMap::new()),
            totals: RwLock::new(HashMap::new()),
        }
    }

    /// Get the bucket boundaries.
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    /// Observe a value for the given label combination.
    pub fn observe(&self, labels: &str, value: f64) {
        // Initialize bucket counts on first observation
        {
            let counts = self.counts.read();
            if !counts.contains_key(labels) {
                drop(counts);
                let mut counts = self.counts.write();
                if !counts.contains_key(labels) {
                    let bucket_counts: Vec<AtomicU64> =
                        (0..self.buckets.len()).map(|_| AtomicU64::new(0)).collect();
                    counts.insert(labels.to_string(), bucket_counts);
                }
            }
        }

        // Cumulative bucket counts
        let counts = self.counts.read();
        if let Some(bucket_counts) = counts.get(labels) {
            for (i, &bound) in self.buckets.iter().enumerate() {
                if value <= bound {
                    bucket_counts[i].fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        {
            let mut sums = self.sums.write();
            *sums.entry(labels.to_string()).or_insert(0.0) += value;
        }
        {
            let mut totals = self.totals.write();
            *totals.entry(labels.to_string()).or_insert(0) += 1;
        }
    }

    /// Get histogram data for export.
    pub fn get_all(&self) -> Vec<HistogramData> {
        let counts = self.counts.read();
        let sums = self.sums.read();
        let totals = self.totals.read();

        counts
            .iter()
            .map(|(labels, bucket_counts)| {
                let bucket_values: Vec<u64> = bucket_counts
                    .iter()
                    .map(|c| c.load(Ordering::Relaxed))
                    .collect();
                HistogramData {
                    labels: labels.clone(),
                    buckets: self.buckets.clone(),
                    counts: bucket_values,
                    sum: *sums.get(labels).unwrap_or(&0.0),
                    count: *totals.get(labels).unwrap_or(&0),
                }
            })
            .collect()
    }
}

/// Histogram data for a single label combination.
#[derive(Debug, Clone)]
pub struct HistogramData {
    /// Label string (e.g., `method="GET",endpoint="/health"`)
    pub labels: String,
    /// Bucket boundaries
    pub buckets: Vec<f64>,
    /// Cumulative counts for each bucket
    pub counts: Vec<u64>,
    /// Sum of all observed values
    pub sum: f64,
    /// Total number of observations
    pub count: u64,
}

/// Buckets for request latency observations (in seconds).
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Buckets for request/response body sizes (in bytes).
pub const SIZE_BUCKETS: &[f64] = &[
    64.0, 256.0, 1024.0, 4096.0, 16384.0, 65536.0, 262144.0, 1048576.0,
];

/// Buckets for percentage observations.
pub const PERCENT_BUCKETS: &[f64] = &[5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 100.0];

/// Buckets for resident memory observations (in bytes, 16 MiB to 4 GiB).
pub const MEMORY_BUCKETS: &[f64] = &[
    16_777_216.0,
    33_554_432.0,
    67_108_864.0,
    134_217_728.0,
    268_435_456.0,
    536_870_912.0,
    1_073_741_824.0,
    4_294_967_296.0,
];
