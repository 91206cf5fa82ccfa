use crate::constants::{DEFAULT_PACING_MS, DEFAULT_START_DATE};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

/// Get news file path from environment variable or use default
pub fn get_news_file() -> PathBuf {
    std::env::var("NEWS_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("news.json"))
}

/// Get sidebar data file path from environment variable or use default
pub fn get_sidebar_file() -> PathBuf {
    std::env::var("SIDEBAR_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("static/data/sidebar.json"))
}

/// Get static assets directory from environment variable or use default
pub fn get_public_dir() -> PathBuf {
    std::env::var("PUBLIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("static"))
}

/// Get market data provider base URL
pub fn get_market_data_base_url() -> String {
    std::env::var("MARKET_DATA_BASE_URL")
        .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string())
}

/// Get the static USD/INR value shown alongside the indices
pub fn get_usd_inr_placeholder() -> String {
    std::env::var("USD_INR_PLACEHOLDER").unwrap_or_else(|_| "83.25".to_string())
}

/// Get the pause between per-ticker analysis fetches
pub fn get_analysis_pacing() -> Duration {
    let millis = std::env::var("ANALYSIS_PACING_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_PACING_MS);
    Duration::from_millis(millis)
}

/// Parse an optional YYYY-MM-DD start date, falling back to the default window start
pub fn parse_start_date(value: Option<&str>) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.unwrap_or(DEFAULT_START_DATE), "%Y-%m-%d")
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
