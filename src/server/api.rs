use crate::models::{AssetClass, FetchFailure, MarketPayload, Quote};
use crate::server::AppState;
use crate::worker::Snapshot;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Value of the `X-Cache` response header for a cache hit/miss
const CACHE_HIT: &str = "HIT";
const CACHE_MISS: &str = "MISS";

/// GET / - Welcome message
pub async fn root_handler() -> &'static str {
    "Welcome! API is live. Try /api/stock/AAPL, /api/forex/EURUSD or /api/history?symbol=AAPL"
}

/// GET /api/stock/{symbol} - Stock quote
#[instrument(skip(state))]
pub async fn stock_handler(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Response {
    quote_response(&state, AssetClass::Stocks, &symbol).await
}

/// GET /api/forex/{pair} - Forex pair quote
#[instrument(skip(state))]
pub async fn forex_handler(State(state): State<AppState>, Path(pair): Path<String>) -> Response {
    quote_response(&state, AssetClass::Forex, &pair).await
}

/// GET /api/commodity/{symbol} - Commodity future quote
#[instrument(skip(state))]
pub async fn commodity_handler(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Response {
    quote_response(&state, AssetClass::Commodities, &symbol).await
}

/// GET /api/index/{symbol} - Market index quote
#[instrument(skip(state))]
pub async fn index_handler(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    quote_response(&state, AssetClass::Indices, &symbol).await
}

/// GET /api/crypto/{pair} - Crypto pair quote
#[instrument(skip(state))]
pub async fn crypto_handler(State(state): State<AppState>, Path(pair): Path<String>) -> Response {
    quote_response(&state, AssetClass::Crypto, &pair).await
}

async fn quote_response(state: &AppState, asset: AssetClass, symbol: &str) -> Response {
    let (outcome, cached) = state.coordinator.resolve_quote(asset, symbol).await;

    match outcome {
        Ok(MarketPayload::Quote(quote)) => {
            info!(symbol = %quote.symbol, price = quote.price, cached, "Returning quote");
            (StatusCode::OK, cache_headers(cached), Json(render_quote(asset, &quote)))
                .into_response()
        }
        Ok(MarketPayload::History(_)) => {
            // A quote key can only hold a quote payload
            failure_response(FetchFailure::upstream("Unexpected payload shape for quote"))
        }
        Err(failure) => failure_response(failure),
    }
}

/// Shape the quote body the way each asset class names its fields
fn render_quote(asset: AssetClass, quote: &Quote) -> serde_json::Value {
    match asset {
        AssetClass::Stocks => serde_json::json!({
            "companyName": quote.name,
            "symbol": quote.symbol,
            "currentPrice": quote.price,
            "marketCap": quote.market_cap,
        }),
        AssetClass::Forex => serde_json::json!({
            "pairName": quote.name,
            "symbol": quote.symbol,
            "currentPrice": quote.price,
            "dayHigh": quote.day_high,
            "dayLow": quote.day_low,
        }),
        AssetClass::Commodities => serde_json::json!({
            "name": quote.name,
            "symbol": quote.symbol,
            "currentPrice": quote.price,
            "dayHigh": quote.day_high,
            "dayLow": quote.day_low,
        }),
        AssetClass::Indices => serde_json::json!({
            "name": quote.name,
            "symbol": quote.symbol,
            "currentPrice": quote.price,
        }),
        AssetClass::Crypto => serde_json::json!({
            "name": quote.name,
            "symbol": quote.symbol,
            "currentPrice": quote.price,
            "currency": quote.currency,
        }),
    }
}

/// Query parameters for the /api/history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub symbol: Option<String>,

    /// History window (default 1mo)
    #[serde(default = "default_period")]
    pub period: String,

    /// Candle interval (default 1d)
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Asset class (default STOCKS)
    #[serde(default = "default_asset_type", rename = "assetType")]
    pub asset_type: String,
}

fn default_period() -> String {
    "1mo".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_asset_type() -> String {
    "STOCKS".to_string()
}

/// GET /api/history - OHLCV history for a symbol
///
/// Examples:
/// - /api/history?symbol=AAPL
/// - /api/history?symbol=AAPL&period=6mo&interval=1d
/// - /api/history?symbol=EURUSD&assetType=FOREX&period=1d&interval=1h
#[instrument(skip(state))]
pub async fn history_handler(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Response {
    debug!(?params, "Received history request");

    let symbol = match params.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(symbol) => symbol.to_string(),
        None => {
            return failure_response(FetchFailure::client("Missing required parameter: symbol"))
        }
    };

    let asset = match AssetClass::from_str(&params.asset_type) {
        Ok(asset) => asset,
        Err(msg) => return failure_response(FetchFailure::client(msg)),
    };

    let (outcome, cached) = state
        .coordinator
        .resolve_history(asset, &symbol, &params.period, &params.interval)
        .await;

    match outcome {
        Ok(MarketPayload::History(bars)) => {
            info!(symbol, bars = bars.len(), cached, "Returning history");
            (StatusCode::OK, cache_headers(cached), Json(bars)).into_response()
        }
        Ok(MarketPayload::Quote(_)) => {
            failure_response(FetchFailure::upstream("Unexpected payload shape for history"))
        }
        Err(failure) => failure_response(failure),
    }
}

/// GET /api/live - Latest snapshot written by the background worker
#[instrument(skip(state))]
pub async fn live_handler(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(state.snapshot_path.as_ref()).await {
        Ok(content) => match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
            Err(e) => {
                warn!(error = %e, "Failed to parse snapshot file");
                failure_response(FetchFailure::upstream("Snapshot file is corrupted"))
            }
        },
        Err(e) => {
            debug!(error = %e, "Snapshot file not readable");
            failure_response(FetchFailure::not_found(
                "No snapshot available yet; the worker has not completed a refresh",
            ))
        }
    }
}

/// GET /health - Uptime and cache statistics
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let stats = state.cache.stats().await;
    let body = serde_json::json!({
        "status": "ok",
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "cache": stats,
    });
    (StatusCode::OK, Json(body)).into_response()
}

fn cache_headers(cached: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-cache",
        if cached { CACHE_HIT } else { CACHE_MISS }.parse().expect("static header value"),
    );
    headers
}

fn failure_response(failure: FetchFailure) -> Response {
    let status =
        StatusCode::from_u16(failure.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(serde_json::json!({ "error": failure.message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bar, Interval, Period};
    use crate::server::{router, AppState};
    use crate::services::{CacheStore, FetchCoordinator, MarketDataSource, SourceError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct FakeSource;

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn fetch_quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
            if symbol.starts_with("NOPE") {
                return Ok(None);
            }
            Ok(Some(Quote {
                symbol: symbol.to_string(),
                name: Some("Apple Inc.".to_string()),
                price: 190.0,
                day_high: Some(191.0),
                day_low: Some(189.0),
                market_cap: Some(3.0e12),
                currency: Some("USD".to_string()),
            }))
        }

        async fn fetch_history(
            &self,
            symbol: &str,
            _period: Period,
            _interval: Interval,
        ) -> Result<Vec<Bar>, SourceError> {
            if symbol.starts_with("NOPE") {
                return Ok(Vec::new());
            }
            let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
            Ok((0..3)
                .map(|i| {
                    Bar::new(
                        start + ChronoDuration::days(i),
                        1.0,
                        2.0,
                        0.5,
                        1.5,
                        100,
                    )
                })
                .collect())
        }
    }

    fn test_state() -> AppState {
        let cache = Arc::new(CacheStore::new(16, Duration::from_secs(60)));
        let coordinator = Arc::new(FetchCoordinator::new(cache.clone(), Arc::new(FakeSource)));
        AppState::new(coordinator, cache, std::path::PathBuf::from("missing_snapshot.json"))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let cache_header = response
            .headers()
            .get("x-cache")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, cache_header, json)
    }

    #[tokio::test]
    async fn test_history_returns_bars_and_cache_header() {
        let state = test_state();
        let app = router(state.clone());

        let (status, cache, body) = get(app.clone(), "/api/history?symbol=AAPL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("MISS"));
        let bars = body.as_array().unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0]["Date"], "2024-01-02T00:00:00+00:00");
        assert_eq!(bars[0]["Open"], 1.0);

        let (status, cache, second) = get(app, "/api/history?symbol=AAPL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("HIT"));
        assert_eq!(second, body);
    }

    #[tokio::test]
    async fn test_history_missing_symbol_is_400() {
        let app = router(test_state());
        let (status, _, body) = get(app, "/api/history").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("symbol"));
    }

    #[tokio::test]
    async fn test_history_invalid_asset_type_is_400() {
        let app = router(test_state());
        let (status, _, body) = get(app, "/api/history?symbol=AAPL&assetType=BONDS").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("BONDS"));
    }

    #[tokio::test]
    async fn test_history_lookback_violation_is_400() {
        let app = router(test_state());
        let (status, _, body) =
            get(app, "/api/history?symbol=AAPL&period=6mo&interval=5m").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("lookback"));
    }

    #[tokio::test]
    async fn test_stock_quote_shape() {
        let app = router(test_state());
        let (status, cache, body) = get(app, "/api/stock/AAPL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("MISS"));
        assert_eq!(body["companyName"], "Apple Inc.");
        assert_eq!(body["currentPrice"], 190.0);
        assert!(body.get("marketCap").is_some());
        assert!(body.get("dayHigh").is_none());
    }

    #[tokio::test]
    async fn test_forex_quote_shape() {
        let app = router(test_state());
        let (status, _, body) = get(app, "/api/forex/EURUSD").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pairName"], "Apple Inc.");
        assert_eq!(body["symbol"], "EURUSD=X");
        assert!(body.get("dayHigh").is_some());
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_404_with_error_body() {
        let app = router(test_state());
        let (status, _, body) = get(app, "/api/stock/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("NOPE"));
    }

    #[tokio::test]
    async fn test_live_without_snapshot_is_404() {
        let app = router(test_state());
        let (status, _, body) = get(app, "/api/live").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("snapshot"));
    }

    #[tokio::test]
    async fn test_health_reports_cache_stats() {
        let state = test_state();
        let app = router(state);

        get(app.clone(), "/api/stock/AAPL").await;
        let (status, _, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache"]["entries"], 1);
        assert_eq!(body["cache"]["capacity"], 16);
    }
}
