use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction derived from a ticker's candle statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
        }
    }
}

/// Candle-relationship statistics for one ticker.
///
/// Every percentage is the share of bars (0..=100) meeting the condition over
/// one non-empty series. Field names on the wire match the dashboard table
/// columns; `low_below_open_pct` intentionally repeats the `Open > Low` share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMetrics {
    #[serde(rename = "Ticker")]
    pub ticker: String,

    #[serde(rename = "High=Open%")]
    pub high_eq_open_pct: f64,

    #[serde(rename = "High>Open%")]
    pub high_above_open_pct: f64,

    #[serde(rename = "High>Open>Low%")]
    pub high_above_open_above_low_pct: f64,

    #[serde(rename = "High=Open>Low%")]
    pub high_eq_open_above_low_pct: f64,

    #[serde(rename = "Low=Open%")]
    pub low_eq_open_pct: f64,

    #[serde(rename = "Low<Open%")]
    pub low_below_open_pct: f64,

    #[serde(rename = "Signal")]
    pub signal: Signal,
}

impl TickerMetrics {
    /// CSV header row, in export column order
    pub const CSV_HEADERS: [&'static str; 8] = [
        "Ticker",
        "High=Open%",
        "High>Open%",
        "High>Open>Low%",
        "High=Open>Low%",
        "Low=Open%",
        "Low<Open%",
        "Signal",
    ];
}

/// BUY/SELL tally over a batch of metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalSummary {
    pub buy: usize,
    pub sell: usize,
}

impl SignalSummary {
    pub fn from_metrics(metrics: &[TickerMetrics]) -> Self {
        metrics.iter().fold(Self::default(), |mut acc, m| {
            match m.signal {
                Signal::Buy => acc.buy += 1,
                Signal::Sell => acc.sell += 1,
            }
            acc
        })
    }
}
