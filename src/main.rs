mod config;
mod frame;
mod routes;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::ServerConfig::from_env().expect("invalid configuration");
    let port = config.port;
    let state = state::AppState::new(config);

    // Spawn background eviction of abandoned rooms.
    let _sweeper = services::sweeper::spawn_idle_sweeper(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "stickyboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
