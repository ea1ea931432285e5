//! Process-wide metric registry.
//!
//! Counters and histograms are registered once by name and updated from
//! concurrent request handlers. Storage and text exposition are delegated to
//! the `prometheus` crate; this module adds a name-keyed dynamic API with a
//! typed error taxonomy on top of it.

pub mod http;
pub mod registry;

pub use http::HttpMetrics;
pub use registry::{MetricRegistry, MetricsError};
