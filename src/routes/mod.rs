//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the HTTP and websocket endpoints under a single Axum
//! router. The static client UI is served from `PUBLIC_DIR` as the fallback,
//! so any path that is not an API route resolves to a file.

pub mod rooms;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// API routes: room minting, the realtime channel and health.
fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/new-room", get(rooms::new_room))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

/// Full application: API routes plus static assets.
pub fn app(state: AppState) -> Router {
    let public_dir = state.config.public_dir.clone();
    let assets = ServeDir::new(public_dir).append_index_html_on_directories(true);

    api_routes(state)
        .fallback_service(assets)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
