use crate::middleware::instrument::instrument_request;
use crate::router::router::create_app_router;
use pulse_core::config::loader::{get_config_path, load_config};
use pulse_core::config::model::Config;
use pulse_core::logging::RequestLogger;
use pulse_core::metrics::{HttpMetrics, MetricRegistry};

use anyhow::Result;
use axum::{middleware, Router};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Application state: the process-wide collaborators, constructed once at
/// startup and injected into the middleware and handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<MetricRegistry>,
    pub http_metrics: Arc<HttpMetrics>,
    pub logger: Arc<RequestLogger>,
}

impl AppState {
    /// Initialization order: configuration, metric registry, request series,
    /// request logger.
    pub fn new(config: Config) -> Result<Self> {
        let registry = Arc::new(MetricRegistry::new());
        let http_metrics = Arc::new(HttpMetrics::register(registry.clone())?);
        let logger = Arc::new(RequestLogger::from_config(&config.logging)?);
        info!("Metric registry and request logger initialized");

        Ok(Self {
            config: Arc::new(config),
            registry,
            http_metrics,
            logger,
        })
    }

    /// Flush buffered log sinks and stop the dispatch task.
    pub async fn shutdown(&self) {
        info!("Shutting down application...");
        self.logger.shutdown().await;
        info!("Application shutdown complete");
    }
}

/// Wire the router, the instrumentation middleware, and the state together.
pub fn create_app(state: AppState) -> Router {
    create_app_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            instrument_request,
        ))
        .with_state(state)
}

/// Start the server and run until a shutdown signal arrives.
pub async fn start_server() -> Result<()> {
    // Diagnostic logging verbosity comes from the RUST_LOG environment variable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting Pulse API server...");
    info!("Configuration file: {}", get_config_path());

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let state = AppState::new(config)?;

    let port = match std::env::var("PORT") {
        Ok(value) => value
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("invalid PORT value '{value}': {e}"))?,
        Err(_) => state.config.server.port,
    };

    let app = create_app(state.clone());

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind port {}: {}", port, e);
            return Err(e.into());
        }
    };
    let addr = listener.local_addr()?;

    info!("Server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /          - Service banner");
    info!("  GET  /health    - Health check");
    info!("  GET  /normal    - Deterministic fast endpoint");
    info!("  GET  /abnormal  - Randomized fast/slow/error endpoint");
    info!("  GET  /metrics   - Prometheus text exposition");

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

    if let Err(e) = server.await {
        error!("Server error: {}", e);
        state.shutdown().await;
        return Err(e.into());
    }

    state.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_index_endpoint() {
        use crate::router::router::index;
        use axum::routing::get;

        let app = Router::new().route("/", get(index));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "Pulse API - Instrumented Demo Service");
    }

    #[tokio::test]
    async fn test_app_state_builds_with_defaults() {
        let mut config = Config::default();
        config.logging.console.enabled = false;

        let state = AppState::new(config).unwrap();
        assert_eq!(state.config.server.port, 4000);
        state.shutdown().await;
    }
}
