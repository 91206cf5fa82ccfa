mod ohlcv;
mod metrics;
mod progress;
mod news;
pub mod snapshot;

pub use metrics::{Signal, SignalSummary, TickerMetrics};
pub use news::{ArticleView, NewsArticle};
pub use ohlcv::{ColumnarBars, DailyBarSeries, IntradayBar, Ohlcv};
pub use progress::AnalysisProgressEvent;
pub use snapshot::{IndexSnapshot, TapeColor, TickerTape, TickerTapeEntry};

use std::collections::HashMap;

/// Recent closes per ticker from a batched intraday request
pub type BatchCloses = HashMap<String, Vec<f64>>;
