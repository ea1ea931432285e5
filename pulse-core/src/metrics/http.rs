use crate::metrics::registry::{MetricRegistry, MetricsError};
use std::sync::Arc;
use std::time::Duration;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

pub const HTTP_LABELS: [&str; 3] = ["method", "endpoint", "status"];

/// Histogram buckets tuned for typical web latencies, in seconds.
pub const LATENCY_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// The two canonical per-request series, registered once at startup.
///
/// Every completed request produces exactly one counter increment and one
/// histogram observation, both carrying identical method/endpoint/status
/// labels.
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Arc<MetricRegistry>,
}

impl HttpMetrics {
    pub fn register(registry: Arc<MetricRegistry>) -> Result<Self, MetricsError> {
        registry.register_counter(
            HTTP_REQUESTS_TOTAL,
            "Total number of HTTP requests",
            &HTTP_LABELS,
        )?;
        registry.register_histogram(
            HTTP_REQUEST_DURATION_SECONDS,
            "HTTP request duration in seconds",
            &HTTP_LABELS,
            &LATENCY_BUCKETS,
        )?;
        Ok(Self { registry })
    }

    pub fn record_request(
        &self,
        method: &str,
        endpoint: &str,
        status: u16,
        duration: Duration,
    ) -> Result<(), MetricsError> {
        let status = status.to_string();
        let labels = [
            ("method", method),
            ("endpoint", endpoint),
            ("status", status.as_str()),
        ];
        self.registry.increment_counter(HTTP_REQUESTS_TOTAL, &labels)?;
        self.registry.observe_histogram(
            HTTP_REQUEST_DURATION_SECONDS,
            &labels,
            duration.as_secs_f64(),
        )
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request_updates_both_series() {
        let registry = Arc::new(MetricRegistry::new());
        let metrics = HttpMetrics::register(registry.clone()).unwrap();

        metrics
            .record_request("GET", "/normal", 200, Duration::from_millis(12))
            .unwrap();

        let labels = [("method", "GET"), ("endpoint", "/normal"), ("status", "200")];
        assert_eq!(
            registry.counter_value(HTTP_REQUESTS_TOTAL, &labels).unwrap(),
            1.0
        );
        assert_eq!(
            registry
                .histogram_sample_count(HTTP_REQUEST_DURATION_SECONDS, &labels)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_register_twice_is_rejected() {
        let registry = Arc::new(MetricRegistry::new());
        HttpMetrics::register(registry.clone()).unwrap();
        assert!(matches!(
            HttpMetrics::register(registry),
            Err(MetricsError::DuplicateMetricName(_))
        ));
    }
}
