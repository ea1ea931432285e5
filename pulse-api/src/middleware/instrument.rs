use crate::app::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use pulse_core::logging::LogLevel;
use serde_json::{json, Map};
use std::time::Instant;

/// Endpoint label for requests that matched no route. Using a fixed label
/// instead of the raw path keeps the metric label space bounded.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Request instrumentation middleware.
///
/// Wraps every request: captures a monotonic start instant on entry and, once
/// the handler has produced a response, records exactly one counter
/// increment, one histogram observation, and one structured log record, all
/// carrying the same method/endpoint/status labels. If the connection is
/// dropped before a response exists this future is dropped with it and
/// nothing is recorded. Recording failures are logged and never affect the
/// response.
pub async fn instrument_request(
    State(state): State<AppState>,
    matched_path: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    // Label by route template, not raw path
    let endpoint = matched_path
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string());

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();

    if let Err(e) = state
        .http_metrics
        .record_request(&method, &endpoint, status, duration)
    {
        tracing::warn!(error = %e, method, endpoint, "failed to record request metrics");
    }

    let level = severity_for_status(status);
    let mut fields = Map::new();
    fields.insert("method".to_string(), json!(method));
    fields.insert("endpoint".to_string(), json!(endpoint));
    fields.insert("status".to_string(), json!(status));
    fields.insert(
        "duration_ms".to_string(),
        json!(duration.as_secs_f64() * 1000.0),
    );
    state.logger.log(level, "request completed", fields);

    response
}

fn severity_for_status(status: u16) -> LogLevel {
    if status >= 500 {
        LogLevel::Error
    } else if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity_for_status(200), LogLevel::Info);
        assert_eq!(severity_for_status(204), LogLevel::Info);
        assert_eq!(severity_for_status(404), LogLevel::Warn);
        assert_eq!(severity_for_status(500), LogLevel::Error);
        assert_eq!(severity_for_status(503), LogLevel::Error);
    }
}
