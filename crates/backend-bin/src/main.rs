// ============================
// crates/backend-bin/src/main.rs
// ============================
//! HopAlong server entry point.
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hopalong_backend_lib::{
    config::Settings, handlers, store::MemoryStore, ws_router, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    let state = Arc::new(AppState::new(MemoryStore::new(), settings));
    state.sessions.start_cleanup();

    let origins: Vec<HeaderValue> = state
        .settings
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let app = handlers::api_router(state.clone())
        .merge(ws_router::create_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(state.settings.bind_addr).await?;
    tracing::info!("listening on {}", state.settings.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
