use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::post;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::breakdown::{AppState, breakdown};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/breakdown", post(breakdown))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error=%e, "install ctrl-c handler failed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Serve until Ctrl-C.
pub async fn run(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
