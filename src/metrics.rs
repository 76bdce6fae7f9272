//! Prometheus metrics for toy operations
//!
//! Counters and latency histograms are kept per operation (`get_toy`,
//! `add_toy`, `buy_toy`) and exposed in text format on `/metrics`.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for request counters
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub operation: String,
    /// "success" or "error"
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    pub operation: String,
    pub error_type: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationLabels {
    pub operation: String,
}

pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Total operations by name and status
    pub requests_total: Family<RequestLabels, Counter>,

    /// Operation latency in seconds
    pub request_duration_seconds: Family<OperationLabels, Histogram>,

    /// Failures by operation and error kind
    pub errors_total: Family<ErrorLabels, Counter>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "toybox_requests",
            "Total number of toy operations",
            requests_total.clone(),
        );

        let request_duration_seconds =
            Family::<OperationLabels, Histogram>::new_with_constructor(|| {
                // 1ms up to roughly 4s
                Histogram::new(exponential_buckets(0.001, 2.5, 10))
            });
        registry.register(
            "toybox_request_duration_seconds",
            "Toy operation latency in seconds",
            request_duration_seconds.clone(),
        );

        let errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "toybox_errors",
            "Total number of failed toy operations by error type",
            errors_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            requests_total,
            request_duration_seconds,
            errors_total,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        if let Err(error) = encode(&mut buffer, &registry) {
            tracing::warn!(%error, "failed to encode metrics");
        }
        buffer
    }

    pub fn record_success(&self, operation: &str, duration: Duration) {
        self.requests_total
            .get_or_create(&RequestLabels {
                operation: operation.to_string(),
                status: "success".to_string(),
            })
            .inc();
        self.observe(operation, duration);
    }

    pub fn record_failure(&self, operation: &str, duration: Duration, error_type: &str) {
        self.requests_total
            .get_or_create(&RequestLabels {
                operation: operation.to_string(),
                status: "error".to_string(),
            })
            .inc();
        self.errors_total
            .get_or_create(&ErrorLabels {
                operation: operation.to_string(),
                error_type: error_type.to_string(),
            })
            .inc();
        self.observe(operation, duration);
    }

    fn observe(&self, operation: &str, duration: Duration) {
        self.request_duration_seconds
            .get_or_create(&OperationLabels {
                operation: operation.to_string(),
            })
            .observe(duration.as_secs_f64());
    }

    pub fn success_count(&self, operation: &str) -> u64 {
        self.requests_total
            .get_or_create(&RequestLabels {
                operation: operation.to_string(),
                status: "success".to_string(),
            })
            .get()
    }

    pub fn error_count(&self, operation: &str, error_type: &str) -> u64 {
        self.errors_total
            .get_or_create(&ErrorLabels {
                operation: operation.to_string(),
                error_type: error_type.to_string(),
            })
            .get()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_successes_and_failures_per_operation() {
        let metrics = MetricsCollector::new();
        metrics.record_success("get_toy", Duration::from_millis(3));
        metrics.record_success("get_toy", Duration::from_millis(5));
        metrics.record_failure("get_toy", Duration::from_millis(1), "not_found");

        assert_eq!(metrics.success_count("get_toy"), 2);
        assert_eq!(metrics.error_count("get_toy", "not_found"), 1);
        assert_eq!(metrics.error_count("buy_toy", "not_found"), 0);
    }

    #[test]
    fn encodes_registered_families() {
        let metrics = MetricsCollector::new();
        metrics.record_success("add_toy", Duration::from_millis(2));

        let text = metrics.encode();
        assert!(text.contains("toybox_requests_total"));
        assert!(text.contains("operation=\"add_toy\""));
        assert!(text.contains("toybox_request_duration_seconds"));
    }
}
