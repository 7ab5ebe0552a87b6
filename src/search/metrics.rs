//! Prometheus metrics for search operations

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};
use std::time::Duration;

/// Search metrics
pub struct SearchMetrics {
    /// Operations by name and outcome
    pub operations: CounterVec,

    /// Operation latency
    pub duration: HistogramVec,

    /// Commands sent to the store per operation
    pub batch_commands: HistogramVec,
}

lazy_static! {
    pub static ref SEARCH_METRICS: SearchMetrics = SearchMetrics {
        operations: register_counter_vec!(
            "zset_search_operations_total",
            "Total number of search operations",
            &["operation", "status"]
        )
        .unwrap(),

        duration: register_histogram_vec!(
            "zset_search_operation_duration_seconds",
            "Search operation latency in seconds",
            &["operation"]
        )
        .unwrap(),

        batch_commands: register_histogram_vec!(
            "zset_search_batch_commands",
            "Number of store commands issued per operation",
            &["operation"],
            vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]
        )
        .unwrap(),
    };
}

impl SearchMetrics {
    /// Record one finished operation
    pub fn record(&self, operation: &str, success: bool, elapsed: Duration, commands: usize) {
        let status = if success { "success" } else { "error" };
        self.operations
            .with_label_values(&[operation, status])
            .inc();
        self.duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
        if commands > 0 {
            self.batch_commands
                .with_label_values(&[operation])
                .observe(commands as f64);
        }
    }
}

/// Initialize search metrics
pub fn init_search_metrics() {
    lazy_static::initialize(&SEARCH_METRICS);
}

/// Every registered metric in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_shows_up_in_export() {
        init_search_metrics();
        SEARCH_METRICS.record("metrics_test", true, Duration::from_millis(3), 4);

        let exported = gather_metrics();
        assert!(exported.contains("zset_search_operations_total"));
        assert!(exported.contains("metrics_test"));
    }
}
