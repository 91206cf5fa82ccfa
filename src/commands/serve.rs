use crate::constants::universe;
use crate::server::{self, AppState};
use crate::services::{BatchAnalysisStreamer, LiveSnapshotRefresher, NewsStore, TradingHours};
use crate::utils::{get_analysis_pacing, get_news_file, get_sidebar_file, get_usd_inr_placeholder};
use std::sync::Arc;

pub async fn run(port: u16) {
    server::init_tracing();
    println!("🚀 Starting niftydash server on port {}", port);

    let source = match super::market_data_source() {
        Ok(source) => source,
        Err(e) => {
            eprintln!("❌ Failed to create market data client: {}", e);
            std::process::exit(1);
        }
    };

    let tickers = universe();
    let pacing = get_analysis_pacing();
    println!(
        "📈 Universe: {} tickers, {}ms between analysis fetches",
        tickers.len(),
        pacing.as_millis()
    );

    let hours = TradingHours::default();
    println!(
        "⏰ Session {:02}:{:02}-{:02}:{:02} {}",
        hours.open.0, hours.open.1, hours.close.0, hours.close.1, hours.timezone
    );

    let news_file = get_news_file();
    let sidebar_file = get_sidebar_file();
    println!("📰 News file: {}", news_file.display());
    println!("📁 Sidebar file: {}", sidebar_file.display());

    let app_state = AppState {
        analysis: BatchAnalysisStreamer::new(source.clone(), tickers.clone(), pacing),
        live: Arc::new(LiveSnapshotRefresher::new(
            source,
            Arc::new(hours),
            tickers,
            get_usd_inr_placeholder(),
        )),
        news: Arc::new(NewsStore::new(news_file, sidebar_file)),
    };

    println!("🌐 Starting HTTP server...");
    if let Err(e) = server::serve(app_state, port).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
