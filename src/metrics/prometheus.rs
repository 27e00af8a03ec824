//! Prometheus text format rendering.
//!
//! Converts the registry's instruments into the standard plaintext
//! exposition format scraped by Prometheus-compatible collectors.

use super::registry::MetricRegistry;
use std::fmt::Write;

/// Render all metrics in Prometheus text format.
///
/// Series with no observations are omitted. Example output:
///
/// ```text
/// # HELP http_requests_total Total number of HTTP requests received
/// # TYPE http_requests_total counter
/// http_requests_total{method="GET",endpoint="/"} 42
///
/// # HELP http_request_latency_seconds HTTP request latency in seconds
/// # TYPE http_request_latency_seconds histogram
/// http_request_latency_seconds_bucket{method="GET",endpoint="/",le="0.1"} 10
/// http_request_latency_seconds_bucket{method="GET",endpoint="/",le="+Inf"} 42
/// http_request_latency_seconds_sum{method="GET",endpoint="/"} 12.345
/// http_request_latency_seconds_count{method="GET",endpoint="/"} 42
/// ```
pub fn render(registry: &MetricRegistry) -> String {
    let mut output = String::with_capacity(4096);

    for (def, counter) in registry.counters() {
        write_counter(&mut output, &def.name, &def.help, counter.get_all());
    }

    for (def, gauge) in registry.gauges() {
        if gauge.is_set() {
            write_gauge(&mut output, &def.name, &def.help, gauge.get());
        }
    }

    for (def, histogram) in registry.histograms() {
        write_histogram(&mut output, &def.name, &def.help, histogram.get_all());
    }

    output
}

fn write_counter(output: &mut String, name: &str, help: &str, values: Vec<(String, u64)>) {
    if values.is_empty() {
        return;
    }

    writeln!(output, "# HELP {name} {help}").unwrap();
    writeln!(output, "# TYPE {name} counter").unwrap();

    for (labels, value) in values {
        if labels.is_empty() {
            writeln!(output, "{name} {value}").unwrap();
        } else {
            writeln!(output, "{name}{{{labels}}} {value}").unwrap();
        }
    }
    writeln!(output).unwrap();
}

fn write_gauge(output: &mut String, name: &str, help: &str, value: i64) {
    writeln!(output, "# HELP {name} {help}").unwrap();
    writeln!(output, "# TYPE {name} gauge").unwrap();
    writeln!(output, "{name} {value}").unwrap();
    writeln!(output).unwrap();
}

fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    data: Vec<super::types::HistogramData>,
) {
    if data.is_empty() {
        return;
    }

    writeln!(output, "# HELP {name} {help}").unwrap();
    writeln!(output, "# TYPE {name} histogram").unwrap();

    for hist_data in data {
        let labels = &hist_data.labels;

        for (i, &bucket) in hist_data.buckets.iter().enumerate() {
            let count = hist_data.counts[i];
            let le = format_le(bucket);

            if labels.is_empty() {
                writeln!(output, "{name}_bucket{{le=\"{le}\"}} {count}").unwrap();
            } else {
                writeln!(output, "{name}_bucket{{{labels},le=\"{le}\"}} {count}").unwrap();
            }
        }

        // +Inf bucket carries the total count
        if labels.is_empty() {
            writeln!(output, "{name}_bucket{{le=\"+Inf\"}} {}", hist_data.count).unwrap();
        } else {
            writeln!(
                output,
                "{name}_bucket{{{labels},le=\"+Inf\"}} {}",
                hist_data.count
            )
            .unwrap();
        }

        if labels.is_empty() {
            writeln!(output, "{name}_sum {}", hist_data.sum).unwrap();
        } else {
            writeln!(output, "{name}_sum{{{labels}}} {}", hist_data.sum).unwrap();
        }

        if labels.is_empty() {
            writeln!(output, "{name}_count {}", hist_data.count).unwrap();
        } else {
            writeln!(output, "{name}_count{{{labels}}} {}", hist_data.count).unwrap();
        }
    }
    writeln!(output).unwrap();
}

/// Format a bucket boundary for the `le` label.
fn format_le(value: f64) -> String {
    if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == value.floor() && value.abs() < 1e10 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::registry::{MetricRegistry, ServiceMetrics};
    use crate::metrics::types::LATENCY_BUCKETS;

    #[test]
    fn test_render_counter() {
        let registry = MetricRegistry::builder()
            .counter("http_requests_total", &["method", "endpoint"], "Total requests")
            .build()
            .unwrap();

        let counter = registry.counter("http_requests_total").unwrap();
        counter.inc("method=\"GET\",endpoint=\"/\"");
        counter.inc("method=\"GET\",endpoint=\"/\"");
        counter.inc("method=\"GET\",endpoint=\"/health\"");

        let output = render(&registry);

        assert!(output.contains("# HELP http_requests_total Total requests"));
        assert!(output.contains("# TYPE http_requests_total counter"));
        assert!(output.contains("http_requests_total{method=\"GET\",endpoint=\"/\"} 2"));
        assert!(output.contains("http_requests_total{method=\"GET\",endpoint=\"/health\"} 1"));
    }

    #[test]
    fn test_render_gauge() {
        let registry = MetricRegistry::builder()
            .gauge("active_users", "OS users on the host")
            .build()
            .unwrap();

        // Unset gauges are omitted
        assert!(!render(&registry).contains("active_users"));

        registry.gauge("active_users").unwrap().set(3);

        let output = render(&registry);
        assert!(output.contains("# TYPE active_users gauge"));
        assert!(output.contains("active_users 3"));
    }

    #[test]
    fn test_render_histogram_cumulative() {
        let registry = MetricRegistry::builder()
            .histogram(
                "http_request_latency_seconds",
                &["method", "endpoint"],
                &[0.1, 0.5, 1.0],
                "Request latency",
            )
            .build()
            .unwrap();

        let hist = registry.histogram("http_request_latency_seconds").unwrap();
        hist.observe("method=\"GET\",endpoint=\"/\"", 0.05);
        hist.observe("method=\"GET\",endpoint=\"/\"", 0.3);

        let output = render(&registry);

        assert!(output.contains("# TYPE http_request_latency_seconds histogram"));
        assert!(output.contains(
            "http_request_latency_seconds_bucket{method=\"GET\",endpoint=\"/\",le=\"0.1\"} 1"
        ));
        assert!(output.contains(
            "http_request_latency_seconds_bucket{method=\"GET\",endpoint=\"/\",le=\"0.5\"} 2"
        ));
        assert!(output.contains(
            "http_request_latency_seconds_bucket{method=\"GET\",endpoint=\"/\",le=\"+Inf\"} 2"
        ));
        assert!(output
            .contains("http_request_latency_seconds_count{method=\"GET\",endpoint=\"/\"} 2"));
    }

    #[test]
    fn test_render_unlabeled_histogram() {
        let registry = MetricRegistry::builder()
            .histogram("memory_usage_bytes", &[], &[1024.0, 4096.0], "RSS bytes")
            .build()
            .unwrap();

        registry.histogram("memory_usage_bytes").unwrap().observe("", 2048.0);

        let output = render(&registry);
        assert!(output.contains("memory_usage_bytes_bucket{le=\"1024\"} 0"));
        assert!(output.contains("memory_usage_bytes_bucket{le=\"4096\"} 1"));
        assert!(output.contains("memory_usage_bytes_sum 2048"));
        assert!(output.contains("memory_usage_bytes_count 1"));
    }

    #[test]
    fn test_format_le() {
        assert_eq!(format_le(0.1), "0.1");
        assert_eq!(format_le(1.0), "1");
        assert_eq!(format_le(10.0), "10");
        assert_eq!(format_le(0.005), "0.005");
        assert_eq!(format_le(f64::INFINITY), "+Inf");
    }

    #[test]
    fn test_full_registry_renders_parseable_blocks() {
        let metrics = ServiceMetrics::register().unwrap();
        metrics.record_request("GET", "/");
        metrics.observe_latency("GET", "/", 0.12);
        metrics.set_active_users(2);

        let output = metrics.render();

        // Every emitted series carries its HELP/TYPE header
        for line in output.lines().filter(|l| !l.is_empty() && !l.starts_with('#')) {
            let name = line
                .split(['{', ' '])
                .next()
                .unwrap()
                .trim_end_matches("_bucket")
                .trim_end_matches("_sum")
                .trim_end_matches("_count");
            assert!(
                output.contains(&format!("# TYPE {name} ")),
                "series `{line}` missing TYPE header"
            );
        }
        assert!(LATENCY_BUCKETS
            .iter()
            .all(|b| output.contains(&format!("le=\"{}\"", format_le(*b)))));
    }
}
