//! Pulse API Server
//!
//! Main entry point for the Pulse instrumented demo service

use pulse_api::app::start_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    start_server().await
}
