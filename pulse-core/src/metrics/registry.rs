use parking_lot::RwLock;
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("metric '{0}' is already registered")]
    DuplicateMetricName(String),
    #[error("invalid bucket configuration for metric '{metric}': {reason}")]
    InvalidBucketConfiguration { metric: String, reason: String },
    #[error("metric '{0}' is not registered")]
    UnknownMetric(String),
    #[error("label set does not match registration for metric '{metric}': {reason}")]
    LabelMismatch { metric: String, reason: String },
    #[error("invalid observation for metric '{metric}': {value}")]
    InvalidObservation { metric: String, value: f64 },
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

enum RegisteredMetric {
    Counter {
        vec: CounterVec,
        label_names: Vec<String>,
    },
    Histogram {
        vec: HistogramVec,
        label_names: Vec<String>,
    },
}

/// Name-keyed registry of counters and histograms.
///
/// Registration takes a write lock on the name table; increments and
/// observations only take a read lock and then rely on the atomicity of the
/// underlying `prometheus` primitives, so concurrent updates never lose
/// counts. Unseen label combinations are created lazily at zero by
/// `with_label_values` before the first update.
pub struct MetricRegistry {
    registry: Registry,
    metrics: RwLock<HashMap<String, RegisteredMetric>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            metrics: RwLock::new(HashMap::new()),
        }
    }

    /// Register a counter family. Fails if the name is taken by any metric,
    /// counter or histogram, regardless of schema.
    pub fn register_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<(), MetricsError> {
        let mut metrics = self.metrics.write();
        if metrics.contains_key(name) {
            return Err(MetricsError::DuplicateMetricName(name.to_string()));
        }

        let vec = CounterVec::new(Opts::new(name, help), label_names)?;
        self.registry.register(Box::new(vec.clone()))?;
        metrics.insert(
            name.to_string(),
            RegisteredMetric::Counter {
                vec,
                label_names: label_names.iter().map(|s| s.to_string()).collect(),
            },
        );
        Ok(())
    }

    /// Register a histogram family with explicit upper-bound buckets. The
    /// bounds must be non-empty and strictly increasing; the implicit `+Inf`
    /// bucket is appended by the exposition layer.
    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<(), MetricsError> {
        validate_buckets(name, buckets)?;

        let mut metrics = self.metrics.write();
        if metrics.contains_key(name) {
            return Err(MetricsError::DuplicateMetricName(name.to_string()));
        }

        let opts = HistogramOpts::new(name, help).buckets(buckets.to_vec());
        let vec = HistogramVec::new(opts, label_names)?;
        self.registry.register(Box::new(vec.clone()))?;
        metrics.insert(
            name.to_string(),
            RegisteredMetric::Histogram {
                vec,
                label_names: label_names.iter().map(|s| s.to_string()).collect(),
            },
        );
        Ok(())
    }

    /// Increment a counter series by one, creating the series on first use.
    /// `labels` is order-independent but must cover exactly the registered
    /// label names.
    pub fn increment_counter(
        &self,
        name: &str,
        labels: &[(&str, &str)],
    ) -> Result<(), MetricsError> {
        let metrics = self.metrics.read();
        match metrics.get(name) {
            Some(RegisteredMetric::Counter { vec, label_names }) => {
                let values = ordered_label_values(name, label_names, labels)?;
                vec.with_label_values(&values).inc();
                Ok(())
            }
            Some(RegisteredMetric::Histogram { .. }) => Err(MetricsError::LabelMismatch {
                metric: name.to_string(),
                reason: "registered as a histogram, not a counter".to_string(),
            }),
            None => Err(MetricsError::UnknownMetric(name.to_string())),
        }
    }

    /// Record one histogram observation. Every bucket whose bound is >= the
    /// value is incremented along with the total count and sum (cumulative
    /// bucket semantics, handled by the underlying histogram).
    pub fn observe_histogram(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        value: f64,
    ) -> Result<(), MetricsError> {
        if !value.is_finite() || value < 0.0 {
            return Err(MetricsError::InvalidObservation {
                metric: name.to_string(),
                value,
            });
        }

        let metrics = self.metrics.read();
        match metrics.get(name) {
            Some(RegisteredMetric::Histogram { vec, label_names }) => {
                let values = ordered_label_values(name, label_names, labels)?;
                vec.with_label_values(&values).observe(value);
                Ok(())
            }
            Some(RegisteredMetric::Counter { .. }) => Err(MetricsError::LabelMismatch {
                metric: name.to_string(),
                reason: "registered as a counter, not a histogram".to_string(),
            }),
            None => Err(MetricsError::UnknownMetric(name.to_string())),
        }
    }

    /// Render all series in the Prometheus text exposition format. The
    /// encoder works on per-family snapshots, so writers are never blocked
    /// beyond the copy and the output is never a torn mix of a single
    /// series' fields.
    pub fn export_text(&self) -> Result<String, MetricsError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&metric_families)?)
    }

    /// Current value of one counter series, zero if the combination has not
    /// been seen yet. Intended for monitoring endpoints and tests.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Result<f64, MetricsError> {
        let metrics = self.metrics.read();
        match metrics.get(name) {
            Some(RegisteredMetric::Counter { vec, label_names }) => {
                let values = ordered_label_values(name, label_names, labels)?;
                Ok(vec.with_label_values(&values).get())
            }
            Some(RegisteredMetric::Histogram { .. }) => Err(MetricsError::LabelMismatch {
                metric: name.to_string(),
                reason: "registered as a histogram, not a counter".to_string(),
            }),
            None => Err(MetricsError::UnknownMetric(name.to_string())),
        }
    }

    /// Observation count of one histogram series, zero if unseen.
    pub fn histogram_sample_count(
        &self,
        name: &str,
        labels: &[(&str, &str)],
    ) -> Result<u64, MetricsError> {
        let metrics = self.metrics.read();
        match metrics.get(name) {
            Some(RegisteredMetric::Histogram { vec, label_names }) => {
                let values = ordered_label_values(name, label_names, labels)?;
                Ok(vec.with_label_values(&values).get_sample_count())
            }
            Some(RegisteredMetric::Counter { .. }) => Err(MetricsError::LabelMismatch {
                metric: name.to_string(),
                reason: "registered as a counter, not a histogram".to_string(),
            }),
            None => Err(MetricsError::UnknownMetric(name.to_string())),
        }
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_buckets(name: &str, buckets: &[f64]) -> Result<(), MetricsError> {
    if buckets.is_empty() {
        return Err(MetricsError::InvalidBucketConfiguration {
            metric: name.to_string(),
            reason: "bucket list is empty".to_string(),
        });
    }
    for pair in buckets.windows(2) {
        if pair[1] <= pair[0] {
            return Err(MetricsError::InvalidBucketConfiguration {
                metric: name.to_string(),
                reason: format!("bounds not strictly increasing: {} then {}", pair[0], pair[1]),
            });
        }
    }
    Ok(())
}

/// Reorder caller-supplied label pairs into the registered label-name order.
fn ordered_label_values<'a>(
    metric: &str,
    label_names: &[String],
    labels: &'a [(&str, &str)],
) -> Result<Vec<&'a str>, MetricsError> {
    if labels.len() != label_names.len() {
        return Err(MetricsError::LabelMismatch {
            metric: metric.to_string(),
            reason: format!(
                "expected {} labels, got {}",
                label_names.len(),
                labels.len()
            ),
        });
    }

    label_names
        .iter()
        .map(|name| {
            labels
                .iter()
                .find(|(key, _)| *key == name.as_str())
                .map(|(_, value)| *value)
                .ok_or_else(|| MetricsError::LabelMismatch {
                    metric: metric.to_string(),
                    reason: format!("missing label '{name}'"),
                })
        })
        .collect()
}
