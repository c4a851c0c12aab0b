use crate::constants::SNAPSHOT_INTERVAL_SECS;
use crate::server::{self, AppState};
use crate::services::{CacheStore, FetchCoordinator, MarketDataSource, YahooClient};
use crate::utils::{get_snapshot_path, get_upstream_url};
use crate::worker;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(port: u16, cache_ttl_secs: u64, cache_capacity: usize) {
    let upstream_url = get_upstream_url();
    tracing::info!(%upstream_url, "Starting marketproxy server on port {}", port);

    let source: Arc<dyn MarketDataSource> = match YahooClient::new(&upstream_url) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to build upstream client: {}", e);
            std::process::exit(1);
        }
    };

    let cache = Arc::new(CacheStore::new(
        cache_capacity,
        Duration::from_secs(cache_ttl_secs),
    ));
    tracing::info!(
        capacity = cache_capacity,
        ttl_secs = cache_ttl_secs,
        "Response cache initialized"
    );

    let coordinator = Arc::new(FetchCoordinator::new(cache.clone(), source.clone()));

    // Background snapshot worker keeps live_data.json fresh for /api/live
    let snapshot_path = get_snapshot_path();
    let worker_source = source.clone();
    let worker_path = snapshot_path.clone();
    tokio::spawn(async move {
        worker::snapshot::run(
            worker_source,
            worker_path,
            Duration::from_secs(SNAPSHOT_INTERVAL_SECS),
        )
        .await;
    });

    let state = AppState::new(coordinator, cache, snapshot_path);
    if let Err(e) = server::serve(state, port).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
