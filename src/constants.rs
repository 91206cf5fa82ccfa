//! Market Constants
//!
//! Fixed facts about the tracked market: the ticker universe, the two indices
//! shown on the dashboard and the trading session.
//!
//! ## Universe
//!
//! The 50 NIFTY constituents in declared order. Analysis events and the
//! ticker tape both follow this order.

/// NIFTY 50 constituents, exchange-qualified
pub const NIFTY_50: [&str; 50] = [
    "ADANIENT.NS", "ADANIPORTS.NS", "APOLLOHOSP.NS", "ASIANPAINT.NS", "AXISBANK.NS",
    "BAJAJ-AUTO.NS", "BAJFINANCE.NS", "BAJAJFINSV.NS", "BPCL.NS", "BHARTIARTL.NS",
    "BRITANNIA.NS", "CIPLA.NS", "COALINDIA.NS", "DIVISLAB.NS", "DRREDDY.NS",
    "EICHERMOT.NS", "GRASIM.NS", "HCLTECH.NS", "HDFCBANK.NS", "HDFCLIFE.NS",
    "HEROMOTOCO.NS", "HINDALCO.NS", "HINDUNILVR.NS", "ICICIBANK.NS", "ITC.NS",
    "INDUSINDBK.NS", "INFY.NS", "JSWSTEEL.NS", "KOTAKBANK.NS", "LTIM.NS",
    "LT.NS", "M&M.NS", "MARUTI.NS", "NTPC.NS", "NESTLEIND.NS",
    "ONGC.NS", "POWERGRID.NS", "RELIANCE.NS", "SBILIFE.NS", "SBIN.NS",
    "SUNPHARMA.NS", "TCS.NS", "TATACONSUM.NS", "TATAMOTORS.NS", "TATASTEEL.NS",
    "TECHM.NS", "TITAN.NS", "UPL.NS", "ULTRACEMCO.NS", "WIPRO.NS",
];

/// Exchange suffix stripped from symbols before display
pub const EXCHANGE_SUFFIX: &str = ".NS";

/// Provider symbol for the BSE Sensex
pub const SENSEX_SYMBOL: &str = "^BSESN";

/// Provider symbol for the NIFTY 50 index
pub const NIFTY_SYMBOL: &str = "^NSEI";

/// Snapshot sentinels
pub const MARKET_CLOSED: &str = "Market Closed";
pub const NOT_AVAILABLE: &str = "N/A";

/// Default analysis window start (YYYY-MM-DD)
pub const DEFAULT_START_DATE: &str = "2008-01-01";

/// Days of index history served to the chart widget
pub const INDEX_CHART_DAYS: i64 = 365;

/// Intraday lookback and bar size for live snapshots
pub const LIVE_LOOKBACK: &str = "1d";
pub const LIVE_INTERVAL: &str = "1m";

/// Pause between per-ticker fetches in the analysis loop
pub const DEFAULT_PACING_MS: u64 = 100;

/// Trading session, local exchange time (inclusive on both ends)
pub const MARKET_TIMEZONE: &str = "Asia/Kolkata";
pub const SESSION_OPEN: (u32, u32) = (9, 15);
pub const SESSION_CLOSE: (u32, u32) = (15, 30);

/// Prefix of exported CSV file names
pub const CSV_FILE_PREFIX: &str = "nifty_50_analysis_";

/// Owned copy of the universe
pub fn universe() -> Vec<String> {
    NIFTY_50.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_universe_is_fifty_unique_tickers() {
        let unique: HashSet<&str> = NIFTY_50.iter().copied().collect();
        assert_eq!(unique.len(), 50);
        assert!(NIFTY_50.iter().all(|t| t.ends_with(EXCHANGE_SUFFIX)));
    }

    #[test]
    fn test_universe_preserves_order() {
        let owned = universe();
        assert_eq!(owned.first().map(String::as_str), Some("ADANIENT.NS"));
        assert_eq!(owned.last().map(String::as_str), Some("WIPRO.NS"));
    }
}
