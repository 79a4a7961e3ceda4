//! Thin HTTP layer over the cached artifacts and the theme queue.
//!
//! The heavy work happens in the batch subcommands; this server only reads
//! what they wrote (`/api/digest`), runs the live selection on demand
//! (`/api/news`), manages the theme queue (`/api/genba/themes`) and proxies
//! translation requests (`/api/translate`). Request logging comes from
//! tower-http's `TraceLayer`.

pub mod handlers;
pub mod themes;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{delete, get, post};
use reqwest::Client as HttpClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::config::Config;

/// Timeout for outbound requests made on behalf of a handler.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// State shared by every handler.
pub struct AppState {
    pub config: Config,
    pub http: HttpClient,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/digest", get(handlers::digest))
        .route("/api/news", get(handlers::news))
        .route(
            "/api/genba/themes",
            get(themes::list).post(themes::add).delete(themes::clear),
        )
        .route("/api/genba/themes/{id}", delete(themes::remove))
        .route("/api/translate", post(handlers::translate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until the process is stopped.
#[instrument(level = "info", skip_all, fields(bind = %config.server.bind))]
pub async fn serve(config: Config) -> Result<()> {
    info!(
        has_news_key = config.news.api_key.is_some(),
        has_openai_key = config.openai.api_key.is_some(),
        has_gemini_key = config.gemini.api_key.is_some(),
        "server starting"
    );

    let bind = config.server.bind.clone();
    let http = HttpClient::builder().timeout(HTTP_TIMEOUT).build()?;
    let state = Arc::new(AppState { config, http });

    let app = router(state);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(addr = %bind, "API listening");
    axum::serve(listener, app).await.context("server crashed")
}
