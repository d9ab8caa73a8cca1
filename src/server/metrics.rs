//! Request metrics: per-(method, path, status) counters and latencies.
//!
//! Each data point of a metric is categorized into these dimensions,
//! making it a data point in a time-series:
//!
//! ```text
//! total_requests{method="POST",path="/write",statusCode="200"} 6
//! total_requests{method="GET",path="/metrics",statusCode="200"} 5
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Mutex;

/// The dimensions request metrics are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricDimensions {
    /// HTTP method: GET/POST/...
    pub method: String,
    /// Requested path, e.g. `/write`.
    pub path: String,
    /// Response status code, e.g. 200.
    pub status_code: u16,
}

#[derive(Debug, Default)]
struct MetricsInner {
    total_requests: HashMap<MetricDimensions, u64>,
    sum_response_time: HashMap<MetricDimensions, f64>,
    avg_response_time: HashMap<MetricDimensions, f64>,
}

/// Process-wide request metrics registry, shared by the middleware and
/// the `/metrics` handler. All mutation happens under one mutex.
#[derive(Debug, Default)]
pub struct Metrics {
    inner: Mutex<MetricsInner>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed request.
    pub fn observe(&self, method: &str, path: &str, status_code: u16, elapsed_seconds: f64) {
        let dimensions = MetricDimensions {
            method: method.to_string(),
            path: path.to_string(),
            status_code,
        };

        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        let total = inner.total_requests.entry(dimensions.clone()).or_insert(0);
        *total += 1;
        let total = *total;
        let sum = inner
            .sum_response_time
            .entry(dimensions.clone())
            .or_insert(0.0);
        *sum += elapsed_seconds;
        let sum = *sum;
        inner
            .avg_response_time
            .insert(dimensions, sum / total as f64);
    }

    /// Renders a snapshot of all metrics as Prometheus-style text, one
    /// line per (metric, dimension-set). Entries are emitted in map
    /// iteration order; consumers must not assume any ordering.
    pub fn render(&self) -> String {
        let inner = self.inner.lock().expect("metrics mutex poisoned");

        let mut out = String::new();
        for (dim, value) in &inner.total_requests {
            let _ = writeln!(
                out,
                "total_requests{{method=\"{}\",path=\"{}\",statusCode=\"{}\"}} {}",
                dim.method, dim.path, dim.status_code, value
            );
        }
        for (dim, value) in &inner.sum_response_time {
            let _ = writeln!(
                out,
                "sum_response_time{{method=\"{}\",path=\"{}\",statusCode=\"{}\"}} {:.6}",
                dim.method, dim.path, dim.status_code, value
            );
        }
        for (dim, value) in &inner.avg_response_time {
            let _ = writeln!(
                out,
                "avg_response_time{{method=\"{}\",path=\"{}\",statusCode=\"{}\"}} {:.6}",
                dim.method, dim.path, dim.status_code, value
            );
        }
        out
    }
}
