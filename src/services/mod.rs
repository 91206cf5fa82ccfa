pub mod batch_analysis;
pub mod csv_export;
pub mod live_snapshot;
pub mod market_data;
pub mod metrics_engine;
pub mod news_store;
pub mod snapshot_cache;
pub mod trading_hours;

pub use batch_analysis::BatchAnalysisStreamer;
pub use live_snapshot::{LiveSnapshotRefresher, SharedRefresher};
pub use market_data::{MarketDataSource, SharedMarketData, YahooChartClient};
pub use news_store::{NewsStore, SharedNewsStore};
pub use snapshot_cache::{CachePhase, CacheState, Lookup, SnapshotCache};
pub use trading_hours::{MarketHours, SharedMarketHours, TradingHours};
