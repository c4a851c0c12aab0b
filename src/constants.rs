//! Service-wide defaults and limits.

/// Default TTL for cached responses (seconds).
///
/// Five minutes keeps quotes reasonably fresh while absorbing bursts of
/// identical requests between upstream refreshes.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Maximum number of entries the response cache holds before the
/// oldest-inserted entry is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Timeout applied to every upstream request.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Default base URL of the upstream chart API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://query1.finance.yahoo.com";

/// Tickers refreshed by the background snapshot worker.
pub const TRACKED_TICKERS: &[&str] = &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA"];

/// How often the snapshot worker refreshes `live_data.json` (seconds).
pub const SNAPSHOT_INTERVAL_SECS: u64 = 300;
