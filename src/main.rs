//! Hotel website server.
//!
//! Serves the public pages from the CMS and, behind `?preview=true` and a
//! shared password, the inline editing API:
//!
//! - `handlers`: page and preview route handlers
//! - `site` / `seo`: page rendering from CMS documents
//! - `cms`: document store backends (hosted CMS or local sled)
//! - `preview`, `overlay`, `reconcile`, `theme`: the editing flow

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::{fmt, EnvFilter};

use hotel::{config::Config, handlers, AppState};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    let bind = config.bind;
    let static_dir = config.static_dir.clone();

    let state = match AppState::new(config).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to open document store");
            std::process::exit(1);
        }
    };

    let app = Router::new()
        // Pages
        .route("/", get(handlers::home))
        .route("/rooms/{slug}", get(handlers::room))
        .route("/healthz", get(handlers::healthz))
        // Preview API
        .route("/api/preview/login", post(handlers::preview_login))
        .route("/api/preview/logout", get(handlers::preview_logout))
        .route("/api/preview/editor", get(handlers::preview_editor))
        .route("/api/preview/theme", get(handlers::preview_theme))
        .route("/api/preview/save", post(handlers::preview_save))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state.clone());

    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%bind, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("Hotel site running at http://{}", bind);
    tracing::info!(store = state.store.name(), "document store ready");
    if state.editing_enabled() {
        tracing::info!("Preview editing: ENABLED (open any page with ?preview=true)");
    } else {
        tracing::info!("Preview editing: DISABLED (set PREVIEW_PASSWORD to enable)");
    }
    if !state.config.can_write() {
        tracing::warn!("SANITY_WRITE_TOKEN not set, saves will fail");
    }

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
    }
}
