use crate::constants::universe;
use crate::error::{AppError, Result};
use crate::models::{AnalysisProgressEvent, SignalSummary};
use crate::server;
use crate::services::BatchAnalysisStreamer;
use crate::services::csv_export::write_metrics_csv;
use crate::utils::{get_analysis_pacing, parse_start_date};
use futures::StreamExt;
use std::fs::File;
use std::path::PathBuf;

pub async fn run(start: Option<String>, output: Option<PathBuf>) {
    server::init_tracing();

    if let Err(e) = analyze(start, output).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn analyze(start: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let start_date = parse_start_date(start.as_deref())
        .map_err(|e| AppError::InvalidInput(format!("start date must be YYYY-MM-DD: {}", e)))?;

    let streamer =
        BatchAnalysisStreamer::new(super::market_data_source()?, universe(), get_analysis_pacing());
    eprintln!(
        "📊 Analysing {} tickers from {}",
        streamer.total(),
        start_date
    );

    // Progress goes to stderr so stdout stays clean CSV
    let mut metrics = Vec::with_capacity(streamer.total());
    let mut events = std::pin::pin!(streamer.run(start_date));
    while let Some(event) = events.next().await {
        let AnalysisProgressEvent::Stock { data, index, total } = event else {
            break;
        };
        match &data {
            Some(m) => eprintln!("   [{:>2}/{}] {:<12} {}", index + 1, total, m.ticker, m.signal),
            None => eprintln!("   [{:>2}/{}] no data", index + 1, total),
        }
        metrics.extend(data);
    }

    let summary = SignalSummary::from_metrics(&metrics);
    eprintln!(
        "✅ {} tickers analysed: {} BUY, {} SELL",
        metrics.len(),
        summary.buy,
        summary.sell
    );

    match output {
        Some(path) => {
            write_metrics_csv(&metrics, File::create(&path)?)?;
            eprintln!("💾 Wrote {}", path.display());
        }
        None => write_metrics_csv(&metrics, std::io::stdout().lock())?,
    }

    Ok(())
}
