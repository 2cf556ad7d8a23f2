//! HTTP gateway for Vouch.
//!
//! Exposes a liveness probe and the governed v1 assistant API. Every
//! generation request is checked against the daily token budget and the
//! per-caller rate limits before the upstream model is called.
//!
//! Built on Axum.

pub mod api_v1;
pub mod client;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use vouch_config::AppConfig;
use vouch_engine::Engine;
use vouch_evidence::FileContentSource;
use vouch_governance::Governor;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub governor: Governor,
    pub engine: Engine,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Wire the provider, content source and governance state from config.
    pub fn from_config(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let provider = vouch_providers::build_from_config(&config)?;
        let content = Arc::new(FileContentSource::new(config.content.root_dir()));
        let engine = Engine::from_config(&config, provider, content);
        let governor = Governor::from_config(&config);
        Ok(Self {
            config,
            governor,
            engine,
        })
    }
}

/// Build the router: `/health` plus the `/v1` API.
///
/// Layers applied:
/// - Request body size limit (`gateway.max_body_bytes`)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let max_body = state.config.gateway.max_body_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.enabled {
        warn!("Assistant is disabled; generation endpoints will answer 503");
    } else if !config.has_api_key() {
        warn!("No API key configured; generation endpoints will answer 503");
    }
    if config.rate_limit.uses_default_salt() {
        warn!("Using the default rate-limit salt; set VOUCH_RATE_LIMIT_SALT in production");
    }

    let state = Arc::new(GatewayState::from_config(config)?);
    info!(
        model = %state.engine.model(),
        daily_token_budget = state.governor.ledger().token_budget(),
        content = %state.config.content.root_dir().display(),
        "Gateway state ready"
    );

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
