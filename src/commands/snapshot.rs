use crate::constants::universe;
use crate::error::Result;
use crate::server;
use crate::services::{LiveSnapshotRefresher, TradingHours};
use crate::utils::get_usd_inr_placeholder;
use std::sync::Arc;

pub async fn run() {
    server::init_tracing();

    if let Err(e) = show_snapshot().await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn show_snapshot() -> Result<()> {
    let refresher = LiveSnapshotRefresher::new(
        super::market_data_source()?,
        Arc::new(TradingHours::default()),
        universe(),
        get_usd_inr_placeholder(),
    );

    let market_open = refresher.market_open();
    let (index_snapshot, ticker_tape) =
        futures::join!(refresher.get_snapshot(), refresher.get_ticker_tape());

    if index_snapshot.is_sentinel() {
        eprintln!("⚠️  No live index values: {}", index_snapshot.nifty);
    }

    let output = serde_json::json!({
        "market_open": market_open,
        "index_snapshot": index_snapshot,
        "ticker_tape": ticker_tape,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
