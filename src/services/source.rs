use crate::models::{Bar, Interval, Period, Quote};
use async_trait::async_trait;
use thiserror::Error as ThisError;

/// Errors surfaced by an upstream market-data provider.
///
/// Distinct from "no data": a well-formed request for an unknown symbol
/// returns an empty result, not an error.
#[derive(ThisError, Debug)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimit,
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

/// Upstream fetch collaborator.
///
/// `fetch_quote` returns `Ok(None)` and `fetch_history` returns an empty
/// series when the symbol yields no data; transport and provider failures
/// come back as [`SourceError`].
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError>;

    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<Bar>, SourceError>;
}
