pub mod asset_class;
pub mod interval;
pub mod market_data;

pub use asset_class::AssetClass;
pub use interval::{within_lookback, Interval, Period};
pub use market_data::{Bar, FetchFailure, MarketOutcome, MarketPayload, Quote};
