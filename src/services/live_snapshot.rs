use crate::constants::{
    INDEX_CHART_DAYS, LIVE_INTERVAL, LIVE_LOOKBACK, MARKET_CLOSED, NIFTY_SYMBOL, NOT_AVAILABLE,
    SENSEX_SYMBOL,
};
use crate::error::FetchError;
use crate::models::snapshot::format_index_level;
use crate::models::{ColumnarBars, IndexSnapshot, TickerTape, TickerTapeEntry};
use crate::services::market_data::SharedMarketData;
use crate::services::snapshot_cache::{CachePhase, Lookup, SnapshotCache};
use crate::services::trading_hours::{SharedMarketHours, TradingHours};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Produces the dashboard's live index snapshot and ticker tape.
///
/// Both artifacts are cached independently; see [`SnapshotCache`] for the
/// open/closed and fallback rules.
pub struct LiveSnapshotRefresher {
    source: SharedMarketData,
    hours: SharedMarketHours,
    universe: Arc<[String]>,
    usd_inr: String,
    indices: SnapshotCache<IndexSnapshot>,
    tape: SnapshotCache<TickerTape>,
}

pub type SharedRefresher = Arc<LiveSnapshotRefresher>;

impl LiveSnapshotRefresher {
    pub fn new(
        source: SharedMarketData,
        hours: SharedMarketHours,
        universe: Vec<String>,
        usd_inr: String,
    ) -> Self {
        Self {
            source,
            hours,
            universe: universe.into(),
            usd_inr,
            indices: SnapshotCache::new("index_snapshot"),
            tape: SnapshotCache::new("ticker_tape"),
        }
    }

    pub fn market_open(&self) -> bool {
        self.hours.is_open()
    }

    /// Cache states as (index snapshot, ticker tape)
    pub async fn phases(&self) -> (CachePhase, CachePhase) {
        (self.indices.get().await.phase(), self.tape.get().await.phase())
    }

    /// Current index snapshot; never fails
    #[instrument(skip(self))]
    pub async fn get_snapshot(&self) -> IndexSnapshot {
        let lookup = self
            .indices
            .refresh(self.market_open(), || self.fetch_index_snapshot())
            .await;

        match lookup {
            Lookup::Fresh(snapshot) | Lookup::Frozen(snapshot) => snapshot,
            Lookup::MarketClosed => IndexSnapshot::sentinel(MARKET_CLOSED, &self.usd_inr),
            Lookup::Unavailable => IndexSnapshot::sentinel(NOT_AVAILABLE, &self.usd_inr),
        }
    }

    /// Current ticker tape in universe order; empty when nothing is known
    #[instrument(skip(self))]
    pub async fn get_ticker_tape(&self) -> TickerTape {
        self.tape
            .refresh(self.market_open(), || self.fetch_ticker_tape())
            .await
            .into_value()
            .unwrap_or_default()
    }

    async fn fetch_index_snapshot(&self) -> Result<IndexSnapshot, FetchError> {
        let (sensex, nifty) = futures::join!(
            self.fetch_index_level(SENSEX_SYMBOL),
            self.fetch_index_level(NIFTY_SYMBOL)
        );

        Ok(IndexSnapshot {
            sensex: sensex?,
            nifty: nifty?,
            usd_inr: self.usd_inr.clone(),
        })
    }

    async fn fetch_index_level(&self, symbol: &str) -> Result<String, FetchError> {
        let bars = self
            .source
            .intraday_bars(symbol, LIVE_LOOKBACK, LIVE_INTERVAL)
            .await?;
        let closes: Vec<f64> = bars[bars.len().saturating_sub(2)..]
            .iter()
            .map(|b| b.close)
            .collect();

        format_index_level(&closes).ok_or_else(|| FetchError::NoData(symbol.to_string()))
    }

    async fn fetch_ticker_tape(&self) -> Result<TickerTape, FetchError> {
        let closes = self
            .source
            .batch_intraday_closes(&self.universe, LIVE_LOOKBACK, LIVE_INTERVAL)
            .await?;

        let mut tape = Vec::with_capacity(self.universe.len());
        for ticker in self.universe.iter() {
            let series = closes.get(ticker).map(Vec::as_slice).unwrap_or_default();
            match TickerTapeEntry::from_closes(ticker, series) {
                Ok(entry) => tape.push(entry),
                Err(gap) => debug!(error = %gap, "Omitting ticker from tape"),
            }
        }

        if tape.is_empty() {
            return Err(FetchError::NoData("ticker tape".to_string()));
        }
        debug!(entries = tape.len(), total = self.universe.len(), "Built ticker tape");
        Ok(tape)
    }

    /// Daily Nifty bars for the chart widget; empty columns on failure
    #[instrument(skip(self))]
    pub async fn index_chart(&self) -> ColumnarBars {
        let end = TradingHours::default().today();
        let start = end - Duration::days(INDEX_CHART_DAYS);

        match self.source.daily_bars(NIFTY_SYMBOL, start, end).await {
            Ok(bars) => ColumnarBars::from(bars.as_slice()),
            Err(e) => {
                warn!(symbol = NIFTY_SYMBOL, error = %e, "Index chart fetch failed");
                ColumnarBars::default()
            }
        }
    }
}
