pub mod api;

use crate::services::{CacheStore, FetchCoordinator};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<FetchCoordinator>,
    pub cache: Arc<CacheStore>,
    pub snapshot_path: Arc<PathBuf>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        coordinator: Arc<FetchCoordinator>,
        cache: Arc<CacheStore>,
        snapshot_path: PathBuf,
    ) -> Self {
        Self {
            coordinator,
            cache,
            snapshot_path: Arc::new(snapshot_path),
            started_at: Instant::now(),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET]);

    Router::new()
        .route("/", get(api::root_handler))
        .route("/api/stock/{symbol}", get(api::stock_handler))
        .route("/api/forex/{pair}", get(api::forex_handler))
        .route("/api/commodity/{symbol}", get(api::commodity_handler))
        .route("/api/index/{symbol}", get(api::index_handler))
        .route("/api/crypto/{pair}", get(api::crypto_handler))
        .route("/api/history", get(api::history_handler))
        .route("/api/live", get(api::live_handler))
        .route("/health", get(api::health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the axum server
pub async fn serve(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Registering routes:");
    tracing::info!("  GET /api/stock/{{symbol}}");
    tracing::info!("  GET /api/forex/{{pair}}");
    tracing::info!("  GET /api/commodity/{{symbol}}");
    tracing::info!("  GET /api/index/{{symbol}}");
    tracing::info!("  GET /api/crypto/{{pair}}");
    tracing::info!("  GET /api/history?symbol=AAPL&period=1mo&interval=1d&assetType=STOCKS");
    tracing::info!("  GET /api/live");
    tracing::info!("  GET /health");

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
