//! Translates logical market-data requests into cache lookups and upstream
//! fetches.
//!
//! Flow: validate → format symbol → build key → cache get → (hit: serve) or
//! (miss: fetch upstream → normalize → cache put → serve). Client-correctable
//! validation failures short-circuit before the cache and are never stored;
//! upstream-caused failures are stored so a failing symbol doesn't trigger a
//! fresh upstream call on every request.

use crate::models::{
    within_lookback, AssetClass, FetchFailure, Interval, MarketOutcome, MarketPayload, Period,
};
use crate::services::cache::{CacheKey, CacheStore, QueryKind};
use crate::services::source::{MarketDataSource, SourceError};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct FetchCoordinator {
    cache: Arc<CacheStore>,
    source: Arc<dyn MarketDataSource>,
}

impl FetchCoordinator {
    pub fn new(cache: Arc<CacheStore>, source: Arc<dyn MarketDataSource>) -> Self {
        Self { cache, source }
    }

    /// Resolve a point-quote request. Period and interval do not apply to
    /// quotes; the key uses fixed defaults so repeated quote requests share
    /// one entry.
    pub async fn resolve_quote(&self, asset: AssetClass, symbol: &str) -> (MarketOutcome, bool) {
        self.resolve(asset, symbol, "1d", "1d", QueryKind::Quote).await
    }

    /// Resolve a history request with textual period/interval parameters.
    pub async fn resolve_history(
        &self,
        asset: AssetClass,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> (MarketOutcome, bool) {
        self.resolve(asset, symbol, period, interval, QueryKind::History)
            .await
    }

    /// Core resolve path shared by quote and history queries.
    ///
    /// Returns the normalized outcome and whether it was served from cache.
    pub async fn resolve(
        &self,
        asset: AssetClass,
        symbol: &str,
        period: &str,
        interval: &str,
        kind: QueryKind,
    ) -> (MarketOutcome, bool) {
        // 1. Validate request parameters. Failures here are client-correctable
        //    and must not touch the cache.
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return (
                Err(FetchFailure::client("Missing required parameter: symbol")),
                false,
            );
        }

        let interval = match Interval::from_str(interval) {
            Ok(interval) => interval,
            Err(msg) => return (Err(FetchFailure::client(msg)), false),
        };
        let period = match Period::from_str(period) {
            Ok(period) => period,
            Err(msg) => return (Err(FetchFailure::client(msg)), false),
        };

        // 2. Intraday lookback guard: reject combinations the upstream is
        //    guaranteed to refuse before spending a round trip on them.
        if kind == QueryKind::History && !within_lookback(period, interval) {
            let message = match interval.max_lookback_days() {
                Some(limit) => format!(
                    "Period '{}' exceeds the {}-day lookback limit for interval '{}'",
                    period, limit, interval
                ),
                None => format!(
                    "Period '{}' is not available for interval '{}'",
                    period, interval
                ),
            };
            return (Err(FetchFailure::client(message)), false);
        }

        // 3. Asset-class symbol formatting, then the composite key.
        let formatted = asset.format_symbol(symbol);
        let key = CacheKey {
            symbol: formatted.clone(),
            period,
            interval,
            kind,
        };

        // 4. Serve from cache while the entry is within its TTL.
        if let Some(outcome) = self.cache.get(&key).await {
            debug!(symbol = %formatted, "Serving from cache");
            return (outcome, true);
        }

        // 5. Cache miss: fetch and normalize.
        let outcome = match kind {
            QueryKind::Quote => self.fetch_quote(&formatted).await,
            QueryKind::History => self.fetch_history(&formatted, period, interval).await,
        };

        // 6. Store upstream outcomes, success or failure. Client errors can't
        //    reach this point.
        self.cache.put(key, outcome.clone()).await;
        (outcome, false)
    }

    async fn fetch_quote(&self, symbol: &str) -> MarketOutcome {
        match self.source.fetch_quote(symbol).await {
            Ok(Some(quote)) => {
                info!(symbol, price = quote.price, "Fetched quote from upstream");
                Ok(MarketPayload::Quote(quote))
            }
            Ok(None) => Err(FetchFailure::not_found(format!(
                "Symbol '{}' not found or data is unavailable",
                symbol
            ))),
            Err(e) => Err(upstream_failure(symbol, e)),
        }
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> MarketOutcome {
        match self.source.fetch_history(symbol, period, interval).await {
            Ok(bars) if bars.is_empty() => Err(FetchFailure::not_found(format!(
                "No data for '{}' with period={} interval={}",
                symbol, period, interval
            ))),
            Ok(mut bars) => {
                // Upstream is expected to return ascending order; don't rely
                // on it. Stable sort keeps equal timestamps in arrival order.
                bars.sort_by_key(|bar| bar.time);
                info!(symbol, bars = bars.len(), "Fetched history from upstream");
                Ok(MarketPayload::History(bars))
            }
            Err(e) => Err(upstream_failure(symbol, e)),
        }
    }
}

fn upstream_failure(symbol: &str, error: SourceError) -> FetchFailure {
    warn!(symbol, error = %error, "Upstream fetch failed");
    FetchFailure::upstream(format!("Failed to fetch data for '{}': {}", symbol, error))
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bar, Quote};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    /// Scripted upstream that counts invocations.
    struct FakeSource {
        quote: Option<Quote>,
        history: Vec<Bar>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn with_history(history: Vec<Bar>) -> Self {
            Self {
                quote: None,
                history,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn with_quote(quote: Quote) -> Self {
            Self {
                quote: Some(quote),
                history: Vec::new(),
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self::with_history(Vec::new())
        }

        fn failing() -> Self {
            Self {
                quote: None,
                history: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn fetch_quote(&self, _symbol: &str) -> Result<Option<Quote>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Network("connection reset".to_string()));
            }
            Ok(self.quote.clone())
        }

        async fn fetch_history(
            &self,
            _symbol: &str,
            _period: Period,
            _interval: Interval,
        ) -> Result<Vec<Bar>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Network("connection reset".to_string()));
            }
            Ok(self.history.clone())
        }
    }

    fn daily_bars(count: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                let time = start + ChronoDuration::days(i as i64);
                Bar::new(time, 10.0 + i as f64, 11.0 + i as f64, 9.0 + i as f64, 10.5 + i as f64, 1000 + i as u64)
            })
            .collect()
    }

    fn coordinator(source: Arc<FakeSource>, ttl: Duration) -> FetchCoordinator {
        FetchCoordinator::new(Arc::new(CacheStore::new(16, ttl)), source)
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_served_from_cache() {
        let source = Arc::new(FakeSource::with_history(daily_bars(21)));
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        let (first, cached_first) = coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "1mo", "1d")
            .await;
        let (second, cached_second) = coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "1mo", "1d")
            .await;

        assert!(!cached_first);
        assert!(cached_second);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_fresh_fetch() {
        let source = Arc::new(FakeSource::with_history(daily_bars(3)));
        let coordinator = coordinator(source.clone(), Duration::from_millis(50));

        coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "1mo", "1d")
            .await;
        sleep(Duration::from_millis(80)).await;
        let (_, cached) = coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "1mo", "1d")
            .await;

        assert!(!cached);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_symbol_case_maps_to_same_entry() {
        let source = Arc::new(FakeSource::with_history(daily_bars(5)));
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        let (_, cached_first) = coordinator
            .resolve_history(AssetClass::Forex, "EURUSD", "1d", "1h")
            .await;
        let (_, cached_second) = coordinator
            .resolve_history(AssetClass::Forex, "eurusd", "1d", "1h")
            .await;

        assert!(!cached_first);
        assert!(cached_second);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_interval_is_rejected_without_caching() {
        let source = Arc::new(FakeSource::with_history(daily_bars(5)));
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        for _ in 0..2 {
            let (outcome, cached) = coordinator
                .resolve_history(AssetClass::Stocks, "AAPL", "1mo", "7m")
                .await;
            let failure = outcome.unwrap_err();
            assert_eq!(failure.status, 400);
            assert!(failure.message.contains("7m"));
            assert!(!cached);
        }

        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_symbol_is_client_error() {
        let source = Arc::new(FakeSource::with_history(daily_bars(5)));
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        let (outcome, cached) = coordinator
            .resolve_history(AssetClass::Stocks, "  ", "1mo", "1d")
            .await;

        assert_eq!(outcome.unwrap_err().status, 400);
        assert!(!cached);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_lookback_guard_rejects_before_upstream_call() {
        let source = Arc::new(FakeSource::with_history(daily_bars(5)));
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        let (outcome, cached) = coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "6mo", "5m")
            .await;

        let failure = outcome.unwrap_err();
        assert_eq!(failure.status, 400);
        assert!(failure.message.contains("6mo"));
        assert!(failure.message.contains("5m"));
        assert!(!cached);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_not_found_is_cached() {
        let source = Arc::new(FakeSource::empty());
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        let (first, _) = coordinator
            .resolve_history(AssetClass::Stocks, "NOPE", "1mo", "1d")
            .await;
        let (second, cached) = coordinator
            .resolve_history(AssetClass::Stocks, "NOPE", "1mo", "1d")
            .await;

        let failure = first.unwrap_err();
        assert_eq!(failure.status, 404);
        assert!(failure.message.contains("NOPE"));
        assert_eq!(second.unwrap_err().status, 404);
        assert!(cached);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_is_cached() {
        let source = Arc::new(FakeSource::failing());
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        let (first, _) = coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "1mo", "1d")
            .await;
        let (_, cached) = coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "1mo", "1d")
            .await;

        assert_eq!(first.unwrap_err().status, 500);
        assert!(cached);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_history_is_sorted_ascending() {
        let mut bars = daily_bars(21);
        bars.reverse(); // upstream order is not trusted
        let source = Arc::new(FakeSource::with_history(bars));
        let coordinator = coordinator(source, Duration::from_secs(60));

        let (outcome, _) = coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "1mo", "1d")
            .await;

        match outcome.unwrap() {
            MarketPayload::History(bars) => {
                assert_eq!(bars.len(), 21);
                assert!(bars.windows(2).all(|w| w[0].time < w[1].time));
                assert!(bars.iter().all(|b| b.volume > 0));
            }
            other => panic!("expected history payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quote_resolution_and_caching() {
        let quote = Quote {
            symbol: "EURUSD=X".to_string(),
            name: Some("EUR/USD".to_string()),
            price: 1.085,
            day_high: Some(1.09),
            day_low: Some(1.08),
            market_cap: None,
            currency: Some("USD".to_string()),
        };
        let source = Arc::new(FakeSource::with_quote(quote.clone()));
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        let (first, cached_first) = coordinator.resolve_quote(AssetClass::Forex, "eurusd").await;
        let (_, cached_second) = coordinator.resolve_quote(AssetClass::Forex, "EURUSD").await;

        assert_eq!(first.unwrap(), MarketPayload::Quote(quote));
        assert!(!cached_first);
        assert!(cached_second);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_quote_and_history_do_not_alias() {
        let source = Arc::new(FakeSource::with_history(daily_bars(2)));
        let coordinator = coordinator(source.clone(), Duration::from_secs(60));

        coordinator
            .resolve_history(AssetClass::Stocks, "AAPL", "1d", "1d")
            .await;
        // Quote for the same triple must not be served from the history entry
        let (outcome, cached) = coordinator.resolve_quote(AssetClass::Stocks, "AAPL").await;

        assert!(!cached);
        assert_eq!(outcome.unwrap_err().status, 404); // fake source has no quote
        assert_eq!(source.call_count(), 2);
    }
}
