use crate::constants::TRACKED_TICKERS;
use crate::services::YahooClient;
use crate::utils::{get_snapshot_path, get_upstream_url};
use crate::worker::refresh_snapshot;

/// One-shot snapshot refresh, useful for cron-style scheduling.
pub async fn run() {
    let client = match YahooClient::new(get_upstream_url()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build upstream client: {}", e);
            std::process::exit(1);
        }
    };

    let path = get_snapshot_path();
    match refresh_snapshot(&client, TRACKED_TICKERS, &path).await {
        Ok(0) => {
            eprintln!("No data fetched, snapshot not written");
            std::process::exit(1);
        }
        Ok(captured) => {
            println!(
                "Snapshot written to {} ({} tickers)",
                path.display(),
                captured
            );
        }
        Err(e) => {
            eprintln!("Snapshot refresh failed: {}", e);
            std::process::exit(1);
        }
    }
}
