//! Batch candle analysis over the ticker universe
//!
//! Tickers are processed one at a time, in universe order, with a fixed pause
//! between provider requests. A failed fetch degrades that ticker's record to
//! absent and the loop moves on; a batch never aborts on a single ticker.

use crate::models::{AnalysisProgressEvent, TickerMetrics};
use crate::services::market_data::SharedMarketData;
use crate::services::metrics_engine;
use crate::services::trading_hours::TradingHours;
use chrono::NaiveDate;
use futures::{Stream, StreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct BatchAnalysisStreamer {
    source: SharedMarketData,
    universe: Arc<[String]>,
    pacing: Duration,
}

impl BatchAnalysisStreamer {
    pub fn new(source: SharedMarketData, universe: Vec<String>, pacing: Duration) -> Self {
        Self {
            source,
            universe: universe.into(),
            pacing,
        }
    }

    pub fn total(&self) -> usize {
        self.universe.len()
    }

    /// Fetch and analyse one ticker over `[start_date, end_date]`
    async fn analyze_ticker(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Option<TickerMetrics> {
        match self.source.daily_bars(ticker, start_date, end_date).await {
            Ok(bars) => {
                let metrics = metrics_engine::compute(&bars, ticker);
                if metrics.is_none() {
                    debug!(ticker, "No daily bars returned");
                }
                metrics
            }
            Err(e) => {
                warn!(ticker, error = %e, "Error fetching daily bars");
                None
            }
        }
    }

    /// Stream one `stock` event per ticker followed by a single `done` event,
    /// analysing bars from `start_date` through today.
    ///
    /// The stream is lazy: each ticker is fetched when the consumer polls for
    /// its event. Each call starts a fresh pass over the universe.
    pub fn run(
        &self,
        start_date: NaiveDate,
    ) -> impl Stream<Item = AnalysisProgressEvent> + Send + use<> {
        self.run_until(start_date, TradingHours::default().today())
    }

    /// Same as [`run`](Self::run) with an explicit last day
    pub fn run_until(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> impl Stream<Item = AnalysisProgressEvent> + Send + use<> {
        let streamer = self.clone();
        let total = streamer.total();
        info!(%start_date, %end_date, total, "Starting batch analysis");

        stream::unfold(Some(0usize), move |cursor| {
            let streamer = streamer.clone();
            async move {
                let index = cursor?;
                if index >= total {
                    info!(total, "Batch analysis done");
                    return Some((AnalysisProgressEvent::Done, None));
                }

                if index > 0 && !streamer.pacing.is_zero() {
                    sleep(streamer.pacing).await;
                }

                let ticker = &streamer.universe[index];
                let data = streamer.analyze_ticker(ticker, start_date, end_date).await;
                debug!(ticker = %ticker, index, total, ok = data.is_some(), "Ticker analysed");

                let event = AnalysisProgressEvent::Stock { data, index, total };
                Some((event, Some(index + 1)))
            }
        })
    }

    /// Run the same pass to completion, keeping only tickers with metrics
    pub async fn collect(&self, start_date: NaiveDate) -> Vec<TickerMetrics> {
        self.collect_until(start_date, TradingHours::default().today()).await
    }

    pub async fn collect_until(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Vec<TickerMetrics> {
        self.run_until(start_date, end_date)
            .filter_map(|event| async move {
                match event {
                    AnalysisProgressEvent::Stock { data, .. } => data,
                    AnalysisProgressEvent::Done => None,
                }
            })
            .collect()
            .await
    }
}
