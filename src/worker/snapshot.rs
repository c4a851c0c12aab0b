//! Background snapshot worker.
//!
//! Periodically fetches quotes for a fixed list of tracked tickers and
//! writes them to a JSON snapshot file served by the `/api/live` endpoint.
//! The file is written atomically (temp file + rename) so readers never see
//! a partial snapshot.

use crate::constants::TRACKED_TICKERS;
use crate::error::Result;
use crate::models::AssetClass;
use crate::services::MarketDataSource;
use crate::utils::format_timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub price: f64,
    #[serde(rename = "companyName")]
    pub company_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub last_updated: String,
    pub stocks: BTreeMap<String, SnapshotEntry>,
}

/// Fetch quotes for the tracked tickers and write the snapshot file.
///
/// Returns the number of tickers captured. Writes nothing when every fetch
/// fails, leaving any previous snapshot intact.
pub async fn refresh_snapshot(
    source: &dyn MarketDataSource,
    tickers: &[&str],
    path: &Path,
) -> Result<usize> {
    let mut stocks = BTreeMap::new();

    for ticker in tickers {
        let symbol = AssetClass::Stocks.format_symbol(ticker);
        match source.fetch_quote(&symbol).await {
            Ok(Some(quote)) => {
                stocks.insert(
                    symbol,
                    SnapshotEntry {
                        price: quote.price,
                        company_name: quote.name.unwrap_or_else(|| "N/A".to_string()),
                    },
                );
            }
            Ok(None) => {
                warn!(ticker = %symbol, "No quote data for tracked ticker");
            }
            Err(e) => {
                warn!(ticker = %symbol, error = %e, "Failed to fetch tracked ticker");
            }
        }
    }

    if stocks.is_empty() {
        warn!("No data fetched, keeping previous snapshot");
        return Ok(0);
    }

    let snapshot = Snapshot {
        last_updated: format_timestamp(&Utc::now()),
        stocks,
    };

    let captured = snapshot.stocks.len();
    let content = serde_json::to_vec_pretty(&snapshot)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &content).await?;
    tokio::fs::rename(&tmp_path, path).await?;

    info!(captured, path = %path.display(), "Snapshot written");
    Ok(captured)
}

/// Run the snapshot worker loop. Never returns; fetch failures are logged
/// and retried on the next tick.
#[instrument(skip(source, path))]
pub async fn run(source: Arc<dyn MarketDataSource>, path: std::path::PathBuf, interval: Duration) {
    info!(
        interval_secs = interval.as_secs(),
        tickers = TRACKED_TICKERS.len(),
        "Starting snapshot worker"
    );

    let mut iteration_count = 0u64;
    loop {
        iteration_count += 1;
        match refresh_snapshot(source.as_ref(), TRACKED_TICKERS, &path).await {
            Ok(captured) => {
                info!(iteration = iteration_count, captured, "Snapshot worker: refresh completed");
            }
            Err(e) => {
                error!(iteration = iteration_count, error = %e, "Snapshot worker: refresh failed");
            }
        }
        sleep(interval).await;
    }
}
