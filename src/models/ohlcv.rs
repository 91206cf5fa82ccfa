use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One daily candle as returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Ohlcv {
    pub fn new(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// High minus open
    pub fn upper_reach(&self) -> f64 {
        self.high - self.open
    }

    /// Open minus low
    pub fn lower_reach(&self) -> f64 {
        self.open - self.low
    }
}

/// Daily bars for one ticker, ordered by date
pub type DailyBarSeries = Vec<Ohlcv>;

/// One intraday close observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntradayBar {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub close: f64,
}

/// Columnar daily bars for the index chart widget
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnarBars {
    pub date: Vec<String>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<u64>,
}

impl From<&[Ohlcv]> for ColumnarBars {
    fn from(bars: &[Ohlcv]) -> Self {
        let mut columns = ColumnarBars::default();
        for bar in bars {
            columns.date.push(bar.time.format("%Y-%m-%d").to_string());
            columns.open.push(bar.open);
            columns.high.push(bar.high);
            columns.low.push(bar.low);
            columns.close.push(bar.close);
            columns.volume.push(bar.volume);
        }
        columns
    }
}
