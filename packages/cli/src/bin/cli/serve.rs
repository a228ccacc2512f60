// ABOUTME: `adapt serve` starts the HTTP API on localhost
// ABOUTME: Adds CORS and request tracing layers and shuts down on Ctrl-C

use std::net::SocketAddr;

use anyhow::Result;
use axum::http::Method;
use colored::*;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use adapt_api::{create_router, AppState};
use adapt_config::AdaptConfig;

pub async fn run(port: Option<u16>) -> Result<()> {
    let config = AdaptConfig::from_env()?;
    let port = port.unwrap_or(config.api_port);
    let state = AppState::from_config(&config).await?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!(
        "{}",
        format!("Adapt API listening on http://{}", addr).green().bold()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
