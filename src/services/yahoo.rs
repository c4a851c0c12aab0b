//! Upstream chart-API client.
//!
//! Speaks the v8 chart endpoint: one GET per query, JSON body with a
//! `chart.result[0]` object carrying meta fields, a timestamp array and
//! parallel OHLCV arrays. A missing `regularMarketPrice` or an empty
//! timestamp array means the symbol has no data, which is not an error.

use crate::constants::UPSTREAM_TIMEOUT_SECS;
use crate::models::{Bar, Interval, Period, Quote};
use crate::services::source::{MarketDataSource, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Option<Value>, SourceError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url,
            symbol,
            period.as_str(),
            interval.as_str()
        );
        debug!(%url, "Fetching upstream chart");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        // Unknown symbols come back as 404 with an error body; that's an
        // empty result, not an upstream failure.
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }
        if !status.is_success() {
            return Err(SourceError::InvalidResponse(format!(
                "upstream returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        if let Some(error) = body.pointer("/chart/error").filter(|v| !v.is_null()) {
            let description = error
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unspecified chart error");
            warn!(symbol, description, "Upstream chart error");
            // "No data found" style errors are empty results
            return Ok(None);
        }

        match body.pointer("/chart/result/0") {
            Some(result) if !result.is_null() => Ok(Some(result.clone())),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        let result = match self.fetch_chart(symbol, Period::Day1, Interval::Day1).await? {
            Some(result) => result,
            None => return Ok(None),
        };

        let meta = match result.get("meta") {
            Some(meta) => meta,
            None => {
                return Err(SourceError::InvalidResponse(
                    "chart result missing meta".to_string(),
                ))
            }
        };

        let price = match meta.get("regularMarketPrice").and_then(Value::as_f64) {
            Some(price) => price,
            // No regular market price means the symbol resolves to nothing
            None => return Ok(None),
        };

        let name = meta
            .get("longName")
            .and_then(Value::as_str)
            .or_else(|| meta.get("shortName").and_then(Value::as_str))
            .map(str::to_string);

        Ok(Some(Quote {
            symbol: meta
                .get("symbol")
                .and_then(Value::as_str)
                .unwrap_or(symbol)
                .to_string(),
            name,
            price,
            day_high: meta.get("regularMarketDayHigh").and_then(Value::as_f64),
            day_low: meta.get("regularMarketDayLow").and_then(Value::as_f64),
            market_cap: meta.get("marketCap").and_then(Value::as_f64),
            currency: meta
                .get("currency")
                .and_then(Value::as_str)
                .map(str::to_string),
        }))
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<Bar>, SourceError> {
        let result = match self.fetch_chart(symbol, period, interval).await? {
            Some(result) => result,
            None => return Ok(Vec::new()),
        };

        let timestamps: Vec<i64> = result
            .pointer("/timestamp")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();

        if timestamps.is_empty() {
            return Ok(Vec::new());
        }

        let quote = result
            .pointer("/indicators/quote/0")
            .ok_or_else(|| SourceError::InvalidResponse("missing quote indicators".to_string()))?;

        let series = |field: &str| -> Vec<Option<f64>> {
            quote
                .get(field)
                .and_then(Value::as_array)
                .map(|arr| arr.iter().map(Value::as_f64).collect())
                .unwrap_or_default()
        };

        let opens = series("open");
        let highs = series("high");
        let lows = series("low");
        let closes = series("close");
        let volumes = series("volume");

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let time = match DateTime::<Utc>::from_timestamp(*ts, 0) {
                Some(time) => time,
                None => continue,
            };
            // Upstream pads holiday rows with nulls; skip incomplete bars
            let (open, high, low, close) = match (
                opens.get(i).copied().flatten(),
                highs.get(i).copied().flatten(),
                lows.get(i).copied().flatten(),
                closes.get(i).copied().flatten(),
            ) {
                (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
                _ => continue,
            };
            let volume = volumes.get(i).copied().flatten().unwrap_or(0.0) as u64;
            bars.push(Bar::new(time, open, high, low, close, volume));
        }

        debug!(symbol, bars = bars.len(), "Fetched history from upstream");
        Ok(bars)
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
