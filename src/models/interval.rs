use serde::{Deserialize, Serialize};
use std::fmt;

/// Candle interval for history queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// 1-minute candles
    Minute1,
    /// 5-minute candles
    Minute5,
    /// 15-minute candles
    Minute15,
    /// 30-minute candles
    Minute30,
    /// 1-hour candles
    Hour1,
    /// Daily candles
    Day1,
    /// Weekly candles
    Week1,
    /// Monthly candles
    Month1,
}

impl Interval {
    /// Parse from the interval identifier used in query parameters
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "1m" => Ok(Interval::Minute1),
            "5m" => Ok(Interval::Minute5),
            "15m" => Ok(Interval::Minute15),
            "30m" => Ok(Interval::Minute30),
            "1h" | "60m" => Ok(Interval::Hour1),
            "1d" => Ok(Interval::Day1),
            "1wk" => Ok(Interval::Week1),
            "1mo" => Ok(Interval::Month1),
            _ => Err(format!(
                "Invalid interval: '{}'. Valid values: 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo",
                s
            )),
        }
    }

    /// Convert to the upstream interval identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
        }
    }

    /// Whether this is a sub-daily interval
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::Minute1
                | Interval::Minute5
                | Interval::Minute15
                | Interval::Minute30
                | Interval::Hour1
        )
    }

    /// Maximum historical window the upstream serves for this interval.
    ///
    /// Intraday data is only retained for a bounded lookback; daily and
    /// coarser intervals have no practical limit. These bounds follow the
    /// documented upstream retention windows.
    pub fn max_lookback_days(&self) -> Option<u32> {
        match self {
            Interval::Minute1 => Some(7),
            Interval::Minute5 | Interval::Minute15 | Interval::Minute30 => Some(60),
            Interval::Hour1 => Some(730),
            Interval::Day1 | Interval::Week1 | Interval::Month1 => None,
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Day1
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requested history window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    Day1,
    Day5,
    Month1,
    Month3,
    Month6,
    Year1,
    Year2,
    Year5,
    Year10,
    Ytd,
    Max,
}

impl Period {
    /// Parse from the period identifier used in query parameters
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "1d" => Ok(Period::Day1),
            "5d" => Ok(Period::Day5),
            "1mo" => Ok(Period::Month1),
            "3mo" => Ok(Period::Month3),
            "6mo" => Ok(Period::Month6),
            "1y" => Ok(Period::Year1),
            "2y" => Ok(Period::Year2),
            "5y" => Ok(Period::Year5),
            "10y" => Ok(Period::Year10),
            "ytd" => Ok(Period::Ytd),
            "max" => Ok(Period::Max),
            _ => Err(format!(
                "Invalid period: '{}'. Valid values: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max",
                s
            )),
        }
    }

    /// Convert to the upstream range identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day1 => "1d",
            Period::Day5 => "5d",
            Period::Month1 => "1mo",
            Period::Month3 => "3mo",
            Period::Month6 => "6mo",
            Period::Year1 => "1y",
            Period::Year2 => "2y",
            Period::Year5 => "5y",
            Period::Year10 => "10y",
            Period::Ytd => "ytd",
            Period::Max => "max",
        }
    }

    /// Upper bound on the window length in days.
    ///
    /// Months count as 31 days and years as 366 so the lookback guard never
    /// under-counts a month-denominated window. `ytd` and `max` use their
    /// worst case.
    pub fn approx_days(&self) -> u32 {
        match self {
            Period::Day1 => 1,
            Period::Day5 => 5,
            Period::Month1 => 31,
            Period::Month3 => 93,
            Period::Month6 => 186,
            Period::Year1 => 366,
            Period::Year2 => 732,
            Period::Year5 => 1830,
            Period::Year10 => 3660,
            Period::Ytd => 366,
            Period::Max => u32::MAX,
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::Month1
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the period/interval combination is within the upstream's
/// retention window for that interval.
pub fn within_lookback(period: Period, interval: Interval) -> bool {
    match interval.max_lookback_days() {
        Some(limit) => period.approx_days() <= limit,
        None => true,
    }
}
