use crate::app::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::{
    demo::{abnormal, normal},
    health::health_check,
    metrics::export_metrics,
};

/// Assemble the application routes.
pub fn create_app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/normal", get(normal))
        .route("/abnormal", get(abnormal))
        .route("/metrics", get(export_metrics))
        .layer(TraceLayer::new_for_http())
}

pub async fn index() -> &'static str {
    "Pulse API - Instrumented Demo Service"
}
