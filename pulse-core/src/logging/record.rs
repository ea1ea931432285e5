use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured event. Immutable once constructed; the timestamp is always
/// stamped here so every serialized record carries it.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            fields,
        }
    }

    /// Serialize to a single JSON line. A record cannot realistically fail to
    /// serialize, but the dispatch path must never panic, so a plain fallback
    /// line is produced instead.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":\"{}\"}}",
                self.timestamp.to_rfc3339(),
                self.level,
                self.message
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_level_serde_round_trip() {
        let level: LogLevel = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(level, LogLevel::Warn);
        assert_eq!(serde_json::to_string(&LogLevel::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn test_record_serializes_with_timestamp_and_flat_fields() {
        let mut fields = Map::new();
        fields.insert("method".to_string(), json!("GET"));
        fields.insert("status".to_string(), json!(200));

        let record = LogRecord::new(LogLevel::Info, "request completed", fields);
        let line = record.to_json_line();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["message"], "request completed");
        assert_eq!(parsed["method"], "GET");
        assert_eq!(parsed["status"], 200);

        // Timestamp is always present and ISO-8601
        let timestamp = parsed["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }
}
