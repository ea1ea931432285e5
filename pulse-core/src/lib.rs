//! Pulse Core Library
//!
//! This library provides core functionality for the Pulse demo service including:
//! - Configuration management
//! - Process-wide metric registry (Prometheus exposition)
//! - Structured request logging with pluggable sinks

pub mod config;
pub mod logging;
pub mod metrics;

// Re-export commonly used types
pub use config::model::{
    Config, DemoConfig, LoggingConfig, Outcome, ServerConfig,
};
pub use logging::{LogLevel, LogRecord, LogSink, RequestLogger};
pub use metrics::{HttpMetrics, MetricRegistry, MetricsError};
