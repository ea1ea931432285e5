use crate::app::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Content type required by the Prometheus scrape protocol.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Serialize the metric registry into the text exposition format.
pub async fn export_metrics(State(state): State<AppState>) -> Response {
    match state.registry.export_text() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", EXPOSITION_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {e}"),
            )
                .into_response()
        }
    }
}
