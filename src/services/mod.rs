pub mod cache;
pub mod coordinator;
pub mod source;
pub mod yahoo;

pub use cache::{CacheKey, CacheStats, CacheStore, QueryKind};
pub use coordinator::FetchCoordinator;
pub use source::{MarketDataSource, SourceError};
pub use yahoo::YahooClient;
