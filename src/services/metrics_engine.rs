//! Candle-relationship statistics
//!
//! For every daily bar two reaches are measured from the open:
//! `d1 = high - open` and `d2 = open - low`. The engine reports how often each
//! reach is zero or positive, as a percentage of all bars, and derives a
//! BUY/SELL signal by comparing the upward and downward shares.

use crate::models::snapshot::strip_exchange_suffix;
use crate::models::{Ohlcv, Signal, TickerMetrics};

/// Compute metrics for one ticker.
///
/// Returns `None` for an empty series; missing data never becomes a zeroed record.
pub fn compute(bars: &[Ohlcv], ticker: &str) -> Option<TickerMetrics> {
    if bars.is_empty() {
        return None;
    }

    let mut high_eq_open = 0usize;
    let mut high_above_open = 0usize;
    let mut high_above_open_above_low = 0usize;
    let mut high_eq_open_above_low = 0usize;
    let mut low_eq_open = 0usize;
    let mut low_below_open = 0usize;

    for bar in bars {
        let d1 = bar.upper_reach();
        let d2 = bar.lower_reach();

        if d1 == 0.0 {
            high_eq_open += 1;
        }
        if d1 > 0.0 {
            high_above_open += 1;
        }
        if d1 > 0.0 && d2 > 0.0 {
            high_above_open_above_low += 1;
        }
        if d1 == 0.0 && d2 > 0.0 {
            high_eq_open_above_low += 1;
        }
        if d2 == 0.0 {
            low_eq_open += 1;
        }
        if d2 > 0.0 {
            low_below_open += 1;
        }
    }

    let total = bars.len() as f64;
    let pct = |count: usize| count as f64 * 100.0 / total;

    let high_above_open_pct = pct(high_above_open);
    let low_below_open_pct = pct(low_below_open);

    Some(TickerMetrics {
        ticker: strip_exchange_suffix(ticker).to_string(),
        high_eq_open_pct: pct(high_eq_open),
        high_above_open_pct,
        high_above_open_above_low_pct: pct(high_above_open_above_low),
        high_eq_open_above_low_pct: pct(high_eq_open_above_low),
        low_eq_open_pct: pct(low_eq_open),
        low_below_open_pct,
        signal: derive_signal(high_above_open_pct, low_below_open_pct),
    })
}

/// BUY only when the upward share strictly exceeds the downward share
pub fn derive_signal(high_above_open_pct: f64, low_below_open_pct: f64) -> Signal {
    if high_above_open_pct > low_below_open_pct {
        Signal::Buy
    } else {
        Signal::Sell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Bar with the given open-relative reaches
    fn bar(day: i64, up: f64, down: f64) -> Ohlcv {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day);
        let open = 100.0;
        Ohlcv::new(time, open, open + up, open - down, open, 1_000)
    }

    #[test]
    fn test_empty_series_has_no_metrics() {
        assert_eq!(compute(&[], "TCS.NS"), None);
    }

    #[test]
    fn test_ten_day_example() {
        // 6 bars reach above the open, 2 dip below it
        let mut bars = Vec::new();
        for day in 0..6 {
            bars.push(bar(day, 1.0, 0.0));
        }
        bars.push(bar(6, 0.0, 2.0));
        bars.push(bar(7, 0.0, 1.5));
        bars.push(bar(8, 0.0, 0.0));
        bars.push(bar(9, 0.0, 0.0));

        let m = compute(&bars, "RELIANCE.NS").unwrap();
        assert_eq!(m.ticker, "RELIANCE");
        assert_eq!(m.high_above_open_pct, 60.0);
        assert_eq!(m.low_below_open_pct, 20.0);
        assert_eq!(m.high_eq_open_pct, 40.0);
        assert_eq!(m.high_eq_open_above_low_pct, 20.0);
        assert_eq!(m.high_above_open_above_low_pct, 0.0);
        assert_eq!(m.low_eq_open_pct, 80.0);
        assert_eq!(m.signal, Signal::Buy);
    }

    #[test]
    fn test_tie_is_sell() {
        let bars = vec![bar(0, 1.0, 0.0), bar(1, 0.0, 1.0)];
        let m = compute(&bars, "ITC.NS").unwrap();
        assert_eq!(m.high_above_open_pct, m.low_below_open_pct);
        assert_eq!(m.signal, Signal::Sell);
    }

    #[test]
    fn test_high_open_shares_sum_to_hundred_without_negative_reach() {
        let bars = vec![bar(0, 2.0, 1.0), bar(1, 0.0, 3.0), bar(2, 0.5, 0.0)];
        let m = compute(&bars, "SBIN.NS").unwrap();
        assert_eq!(m.high_eq_open_pct + m.high_above_open_pct, 100.0);
    }

    #[test]
    fn test_bad_print_below_open_breaks_the_sum() {
        // High below open is a bad provider print; it lands in neither bucket
        let mut odd = bar(1, 0.0, 0.0);
        odd.high = odd.open - 1.0;
        let bars = vec![bar(0, 1.0, 1.0), odd];
        let m = compute(&bars, "UPL.NS").unwrap();
        assert!(m.high_eq_open_pct + m.high_above_open_pct < 100.0);
    }

    #[test]
    fn test_percentages_stay_in_range() {
        let bars: Vec<Ohlcv> = (0..37)
            .map(|i| bar(i, (i % 3) as f64, (i % 5) as f64 * 0.5))
            .collect();
        let m = compute(&bars, "TITAN.NS").unwrap();
        for value in [
            m.high_eq_open_pct,
            m.high_above_open_pct,
            m.high_above_open_above_low_pct,
            m.high_eq_open_above_low_pct,
            m.low_eq_open_pct,
            m.low_below_open_pct,
        ] {
            assert!((0.0..=100.0).contains(&value), "out of range: {}", value);
        }
    }

    #[test]
    fn test_signal_rule() {
        assert_eq!(derive_signal(50.1, 50.0), Signal::Buy);
        assert_eq!(derive_signal(50.0, 50.0), Signal::Sell);
        assert_eq!(derive_signal(10.0, 90.0), Signal::Sell);
    }
}
