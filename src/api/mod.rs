//! HTTP surface of the ranking engine.

pub mod error;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::{NotifyConfig, ServerConfig};
use crate::notify::PushClient;
use crate::ranking::cache::BoardCache;

/// Shared state accessible by all route handlers.
#[derive(Clone)]
pub struct ApiState {
    pub cache: Arc<BoardCache>,
    pub push: Arc<PushClient>,
    pub default_limit: usize,
    pub push_top_slice: usize,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(
        cache: Arc<BoardCache>,
        push: Arc<PushClient>,
        server: &ServerConfig,
        notify: &NotifyConfig,
    ) -> Self {
        Self {
            cache,
            push,
            default_limit: server.default_limit,
            push_top_slice: notify.top_slice,
            started_at: Utc::now(),
        }
    }
}

/// Build the router with every leaderboard route attached.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/top", get(routes::top_handler))
        .route("/farmer/{farmer_id}", get(routes::farmer_handler))
        .route("/stats", get(routes::stats_handler))
        .route("/region/{kind}/{name}", get(routes::region_handler))
        .route("/refresh", post(routes::refresh_handler))
        .route("/health", get(routes::health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the listener and serve until shutdown.
pub async fn serve(state: ApiState, bind: &str, port: u16) -> Result<()> {
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind leaderboard API to {addr}"))?;

    info!(addr = %addr, "Leaderboard API listening");

    axum::serve(listener, router(state))
        .await
        .context("Leaderboard API server error")?;
    Ok(())
}
