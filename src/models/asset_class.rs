use serde::{Deserialize, Serialize};

/// Asset class for market data queries
///
/// Determines which symbol-formatting rule the upstream provider expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetClass {
    /// Plain equity tickers (AAPL, MSFT)
    Stocks,

    /// Currency pairs, upstream symbol gets a "=X" suffix (EURUSD=X)
    Forex,

    /// Commodity futures, upstream symbol gets a "=F" suffix (GC=F)
    Commodities,

    /// Market indices, upstream symbol gets a "^" prefix (^GSPC)
    Indices,

    /// Crypto pairs quoted in USD, upstream symbol gets a "-USD" suffix (BTC-USD)
    Crypto,
}

impl Default for AssetClass {
    fn default() -> Self {
        AssetClass::Stocks
    }
}

impl AssetClass {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "STOCKS" | "STOCK" => Ok(AssetClass::Stocks),
            "FOREX" | "FX" => Ok(AssetClass::Forex),
            "COMMODITIES" | "COMMODITY" => Ok(AssetClass::Commodities),
            "INDICES" | "INDEX" => Ok(AssetClass::Indices),
            "CRYPTO" | "CRYPTOS" => Ok(AssetClass::Crypto),
            _ => Err(format!(
                "Invalid asset type: '{}'. Valid values: STOCKS, FOREX, COMMODITIES, INDICES, CRYPTO",
                s
            )),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Stocks => "STOCKS",
            AssetClass::Forex => "FOREX",
            AssetClass::Commodities => "COMMODITIES",
            AssetClass::Indices => "INDICES",
            AssetClass::Crypto => "CRYPTO",
        }
    }

    /// Apply the upstream symbol-formatting rule for this asset class.
    ///
    /// Uppercases the input and appends/prepends the class marker. Safe to
    /// call on an already-formatted symbol; the marker is never doubled.
    pub fn format_symbol(&self, raw: &str) -> String {
        let symbol = raw.trim().to_uppercase();
        match self {
            AssetClass::Stocks => symbol,
            AssetClass::Forex => {
                if symbol.ends_with("=X") {
                    symbol
                } else {
                    format!("{}=X", symbol)
                }
            }
            AssetClass::Commodities => {
                if symbol.ends_with("=F") {
                    symbol
                } else {
                    format!("{}=F", symbol)
                }
            }
            AssetClass::Indices => {
                if symbol.starts_with('^') {
                    symbol
                } else {
                    format!("^{}", symbol)
                }
            }
            AssetClass::Crypto => {
                if symbol.ends_with("-USD") {
                    symbol
                } else {
                    format!("{}-USD", symbol)
                }
            }
        }
    }
}
