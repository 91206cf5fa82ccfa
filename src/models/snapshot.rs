use crate::constants::{EXCHANGE_SUFFIX, MARKET_CLOSED, NOT_AVAILABLE};
use crate::error::DataGapError;
use crate::utils::round2;
use serde::Serialize;

/// Sign of a price change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            Direction::Up
        } else if change < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Flat => "⏺",
        }
    }

    pub fn color(self) -> TapeColor {
        match self {
            Direction::Up => TapeColor::Green,
            Direction::Down => TapeColor::Red,
            Direction::Flat => TapeColor::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TapeColor {
    Green,
    Red,
    White,
}

/// Live index levels keyed by display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSnapshot {
    #[serde(rename = "Sensex")]
    pub sensex: String,
    #[serde(rename = "Nifty")]
    pub nifty: String,
    #[serde(rename = "USD/INR")]
    pub usd_inr: String,
}

impl IndexSnapshot {
    /// Snapshot whose fetched labels all carry `text`
    pub fn sentinel(text: &str, usd_inr: &str) -> Self {
        Self {
            sensex: text.to_string(),
            nifty: text.to_string(),
            usd_inr: usd_inr.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.sensex == self.nifty && (self.sensex == NOT_AVAILABLE || self.sensex == MARKET_CLOSED)
    }
}

/// Render an index level from its most recent closes.
///
/// Two or more closes give `"<latest> <arrow> <|diff|>"`; a single close is
/// shown on its own. Returns `None` when there is nothing to show.
pub fn format_index_level(closes: &[f64]) -> Option<String> {
    match closes {
        [] => None,
        [only] => Some(format!("{:.2}", only)),
        [.., previous, latest] => {
            let diff = latest - previous;
            let direction = Direction::of(round2(diff));
            Some(format!("{:.2} {} {:.2}", latest, direction.arrow(), diff.abs()))
        }
    }
}

/// One scrolling ticker entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerTapeEntry {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub arrow: &'static str,
    pub color: TapeColor,
}

impl TickerTapeEntry {
    /// Build an entry from a ticker's recent closes (oldest first)
    pub fn from_closes(ticker: &str, closes: &[f64]) -> Result<Self, DataGapError> {
        let [.., previous, latest] = closes else {
            return Err(DataGapError {
                symbol: ticker.to_string(),
                observed: closes.len(),
            });
        };

        let change = round2(latest - previous);
        let direction = Direction::of(change);
        Ok(Self {
            symbol: strip_exchange_suffix(ticker).to_string(),
            price: round2(*latest),
            change,
            arrow: direction.arrow(),
            color: direction.color(),
        })
    }
}

/// Full ticker tape in universe order
pub type TickerTape = Vec<TickerTapeEntry>;

/// Drop the exchange qualifier from a symbol
pub fn strip_exchange_suffix(ticker: &str) -> &str {
    ticker.strip_suffix(EXCHANGE_SUFFIX).unwrap_or(ticker)
}
