use crate::app::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pulse_core::config::model::Outcome;
use rand::Rng;
use serde_json::{json, Value};

pub const NORMAL_MESSAGE: &str = "This is a normal API response";
pub const FAST_MESSAGE: &str = "This is a fast API response";
pub const SLOW_MESSAGE: &str = "This is a delayed API response";
pub const ERROR_MESSAGE: &str = "Simulated internal failure";

/// Deterministic endpoint: always succeeds immediately.
pub async fn normal() -> Json<Value> {
    Json(json!({ "message": NORMAL_MESSAGE }))
}

/// Randomized endpoint: one uniform draw per invocation, partitioned into
/// error / slow-success / fast-success bands by the configured boundaries.
/// The slow band suspends only this request's task.
pub async fn abnormal(State(state): State<AppState>) -> Response {
    let draw: f64 = rand::rng().random();
    match state.config.demo.classify(draw) {
        Outcome::Error => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": ERROR_MESSAGE })),
        )
            .into_response(),
        Outcome::Slow => {
            tokio::time::sleep(state.config.demo.slow_delay()).await;
            Json(json!({ "message": SLOW_MESSAGE })).into_response()
        }
        Outcome::Fast => Json(json!({ "message": FAST_MESSAGE })).into_response(),
    }
}
