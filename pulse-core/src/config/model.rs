use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Listen port; overridden by the PORT environment variable
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Outcome banding for the randomized demo endpoint.
///
/// A uniform draw in `[0, 1)` falls into one of three bands:
/// `[0, error_upto)` produces a simulated server error,
/// `[error_upto, slow_upto)` produces a delayed success, and the
/// remainder produces an immediate success.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DemoConfig {
    #[serde(default = "default_error_upto")]
    pub error_upto: f64,
    #[serde(default = "default_slow_upto")]
    pub slow_upto: f64,
    #[serde(default = "default_slow_delay_ms")]
    pub slow_delay_ms: u64,
}

/// Classified band of a single draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Fast,
    Slow,
    Error,
}

impl DemoConfig {
    /// Map one uniform draw onto its outcome band.
    pub fn classify(&self, draw: f64) -> Outcome {
        if draw < self.error_upto {
            Outcome::Error
        } else if draw < self.slow_upto {
            Outcome::Slow
        } else {
            Outcome::Fast
        }
    }

    pub fn slow_delay(&self) -> Duration {
        Duration::from_millis(self.slow_delay_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Capacity of the hand-off queue between request handlers and the
    /// dispatch task; records submitted while the queue is full are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default)]
    pub console: ConsoleSinkConfig,
    #[serde(default)]
    pub file: FileSinkConfig,
    #[serde(default)]
    pub collector: CollectorSinkConfig,
}

impl LoggingConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConsoleSinkConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_console_level")]
    pub min_level: LogLevel,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FileSinkConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_log_prefix")]
    pub prefix: String,
    #[serde(default = "default_file_level")]
    pub min_level: LogLevel,
    /// Size cap per file; exceeding it rolls to a numbered sibling
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CollectorSinkConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_collector_level")]
    pub min_level: LogLevel,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_port() -> u16 {
    4000
}

fn default_error_upto() -> f64 {
    0.2
}

fn default_slow_upto() -> f64 {
    0.5
}

fn default_slow_delay_ms() -> u64 {
    3000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_console_level() -> LogLevel {
    LogLevel::Debug
}

fn default_file_level() -> LogLevel {
    LogLevel::Info
}

fn default_collector_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "pulse".to_string()
}

fn default_max_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_retention_days() -> u32 {
    14
}

fn default_batch_size() -> usize {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            error_upto: default_error_upto(),
            slow_upto: default_slow_upto(),
            slow_delay_ms: default_slow_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            flush_interval_ms: default_flush_interval_ms(),
            console: ConsoleSinkConfig::default(),
            file: FileSinkConfig::default(),
            collector: CollectorSinkConfig::default(),
        }
    }
}

impl Default for ConsoleSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_level: default_console_level(),
        }
    }
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_log_dir(),
            prefix: default_log_prefix(),
            min_level: default_file_level(),
            max_bytes: default_max_bytes(),
            retention_days: default_retention_days(),
        }
    }
}

impl Default for CollectorSinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            min_level: default_collector_level(),
            batch_size: default_batch_size(),
        }
    }
}
