use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV record for a single time interval
///
/// Serialized field names match the public history response shape:
/// `{Date, Open, High, Low, Close, Volume}` with the timestamp in the
/// canonical UTC format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Timestamp of the data point
    #[serde(rename = "Date", with = "crate::utils::canonical_time")]
    pub time: DateTime<Utc>,

    /// Opening price
    #[serde(rename = "Open")]
    pub open: f64,

    /// Highest price
    #[serde(rename = "High")]
    pub high: f64,

    /// Lowest price
    #[serde(rename = "Low")]
    pub low: f64,

    /// Closing price
    #[serde(rename = "Close")]
    pub close: f64,

    /// Trading volume
    #[serde(rename = "Volume")]
    pub volume: u64,
}

impl Bar {
    pub fn new(time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Point-in-time quote fields, as far as the upstream provides them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Upstream symbol the quote was resolved for
    pub symbol: String,

    /// Long or short display name, whichever the upstream supplies
    pub name: Option<String>,

    /// Last traded / regular market price
    pub price: f64,

    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub market_cap: Option<f64>,
    pub currency: Option<String>,
}

/// Successfully normalized upstream data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketPayload {
    Quote(Quote),
    History(Vec<Bar>),
}

/// A recoverable fetch failure with its HTTP-equivalent status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub status: u16,
    pub message: String,
}

impl FetchFailure {
    /// Bad or inconsistent request parameters. Never cached: the client can
    /// correct these on retry.
    pub fn client(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    /// Upstream returned no data for a well-formed request
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            message: message.into(),
        }
    }

    /// Upstream call failed
    pub fn upstream(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }

    /// Client-caused failures must not be cached; the same request corrected
    /// by the client would otherwise keep returning the stale error.
    pub fn is_client_error(&self) -> bool {
        self.status == 400
    }
}

/// Outcome of a resolve: normalized data or a structured failure
pub type MarketOutcome = std::result::Result<MarketPayload, FetchFailure>;
