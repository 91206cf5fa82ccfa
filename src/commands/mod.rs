pub mod analyze;
pub mod serve;
pub mod snapshot;

use crate::error::Result;
use crate::services::{SharedMarketData, YahooChartClient};
use crate::utils::get_market_data_base_url;
use std::sync::Arc;

/// Provider client for the configured base URL
fn market_data_source() -> Result<SharedMarketData> {
    let base_url = get_market_data_base_url();
    let client = YahooChartClient::new(&base_url, true)?;
    Ok(Arc::new(client))
}
