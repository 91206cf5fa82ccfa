use crate::error::{AppError, FetchError};
use crate::models::{BatchCloses, DailyBarSeries, IntradayBar, Ohlcv};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use reqwest::Url;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

/// Price data provider used by the analysis and snapshot services
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily bars for `ticker` from `start` through `end` (inclusive), oldest first
    async fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyBarSeries, FetchError>;

    /// Intraday closes for `ticker` over the trailing `lookback`, oldest first
    async fn intraday_bars(
        &self,
        ticker: &str,
        lookback: &str,
        interval: &str,
    ) -> Result<Vec<IntradayBar>, FetchError>;

    /// Intraday closes for many tickers at once.
    ///
    /// Tickers the provider had nothing for are absent from the map.
    async fn batch_intraday_closes(
        &self,
        tickers: &[String],
        lookback: &str,
        interval: &str,
    ) -> Result<BatchCloses, FetchError>;
}

pub type SharedMarketData = Arc<dyn MarketDataSource>;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChartErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Decode a chart response body into its single result
fn parse_chart(symbol: &str, body: &str) -> Result<ChartResult, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("{}: {}", symbol, e)))?;

    if let Some(err) = envelope.chart.error {
        return Err(FetchError::Provider(format!(
            "{}: {} {}",
            symbol, err.code, err.description
        )));
    }

    envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::NoData(symbol.to_string()))
}

fn timestamp_at(symbol: &str, index: usize, ts: i64) -> Result<DateTime<Utc>, FetchError> {
    DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| {
        FetchError::Malformed(format!("{}: bad timestamp {} at index {}", symbol, ts, index))
    })
}

/// Daily bars from a chart body, skipping rows with any missing price
pub(crate) fn parse_daily_bars(symbol: &str, body: &str) -> Result<DailyBarSeries, FetchError> {
    let result = parse_chart(symbol, body)?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let length = result.timestamp.len();
    if [quote.open.len(), quote.high.len(), quote.low.len(), quote.close.len()]
        .iter()
        .any(|&len| len != length)
    {
        return Err(FetchError::Malformed(format!(
            "{}: inconsistent array lengths",
            symbol
        )));
    }

    let mut bars = Vec::with_capacity(length);
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) =
            (quote.open[i], quote.high[i], quote.low[i], quote.close[i])
        else {
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);
        bars.push(Ohlcv::new(
            timestamp_at(symbol, i, ts)?,
            open,
            high,
            low,
            close,
            volume.max(0.0) as u64,
        ));
    }

    if bars.is_empty() {
        return Err(FetchError::NoData(symbol.to_string()));
    }

    bars.sort_by(|a, b| a.time.cmp(&b.time));
    Ok(bars)
}

/// Intraday closes from a chart body, skipping missing observations
pub(crate) fn parse_intraday_bars(
    symbol: &str,
    body: &str,
) -> Result<Vec<IntradayBar>, FetchError> {
    let result = parse_chart(symbol, body)?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    if quote.close.len() != result.timestamp.len() {
        return Err(FetchError::Malformed(format!(
            "{}: inconsistent array lengths",
            symbol
        )));
    }

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, (&ts, close)) in result.timestamp.iter().zip(quote.close).enumerate() {
        if let Some(close) = close {
            bars.push(IntradayBar {
                time: timestamp_at(symbol, i, ts)?,
                close,
            });
        }
    }

    bars.sort_by(|a, b| a.time.cmp(&b.time));
    Ok(bars)
}

/// Client for the public chart API
#[derive(Clone)]
pub struct YahooChartClient {
    client: reqwest::Client,
    base_url: Url,
    user_agents: Vec<String>,
    random_agent: bool,
}

impl YahooChartClient {
    pub fn new(base_url: &str, random_agent: bool) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url.trim()).map_err(|e| {
            AppError::Config(format!("Invalid market data URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Invalid market data URL '{}': must be http(s)",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        Ok(Self {
            client,
            base_url,
            user_agents,
            random_agent,
        })
    }

    fn get_user_agent(&self) -> &str {
        if self.random_agent {
            use rand::seq::SliceRandom;
            if let Some(agent) = self.user_agents.choose(&mut rand::thread_rng()) {
                return agent;
            }
        }
        &self.user_agents[0]
    }

    fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL is hierarchical
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v8", "finance", "chart", symbol]);
        }
        url
    }

    async fn get_chart(
        &self,
        symbol: &str,
        query: &[(&str, String)],
    ) -> Result<String, FetchError> {
        let url = self.chart_url(symbol);
        debug!(symbol, url = %url, ?query, "Requesting chart");

        let response = self
            .client
            .get(url)
            .query(query)
            .header(USER_AGENT, self.get_user_agent())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Unknown symbols come back as 404 with a chart error body
            if let Err(err @ FetchError::Provider(_)) = parse_chart(symbol, &body) {
                return Err(err);
            }
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(body)
    }
}

#[async_trait]
impl MarketDataSource for YahooChartClient {
    async fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyBarSeries, FetchError> {
        let period1 = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        let period2 = end
            .checked_add_days(Days::new(1))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp());
        let (Some(period1), Some(period2)) = (period1, period2) else {
            return Err(FetchError::Malformed(format!("{}: invalid date range", ticker)));
        };

        let query = [
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ];
        let body = self.get_chart(ticker, &query).await?;
        let bars = parse_daily_bars(ticker, &body)?;
        debug!(ticker, records = bars.len(), "Fetched daily bars");
        Ok(bars)
    }

    async fn intraday_bars(
        &self,
        ticker: &str,
        lookback: &str,
        interval: &str,
    ) -> Result<Vec<IntradayBar>, FetchError> {
        let query = [
            ("range", lookback.to_string()),
            ("interval", interval.to_string()),
        ];
        let body = self.get_chart(ticker, &query).await?;
        parse_intraday_bars(ticker, &body)
    }

    async fn batch_intraday_closes(
        &self,
        tickers: &[String],
        lookback: &str,
        interval: &str,
    ) -> Result<BatchCloses, FetchError> {
        let tasks = tickers.iter().map(|ticker| async move {
            let result = self.intraday_bars(ticker, lookback, interval).await;
            (ticker, result)
        });
        let results = futures::future::join_all(tasks).await;

        let mut closes = HashMap::with_capacity(tickers.len());
        let mut last_error = None;
        for (ticker, result) in results {
            match result {
                Ok(bars) => {
                    closes.insert(ticker.clone(), bars.into_iter().map(|b| b.close).collect());
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Intraday fetch failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(err) if closes.is_empty() => Err(err),
            _ => Ok(closes),
        }
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted in-memory provider for service tests

    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct StubSource {
        daily: HashMap<String, DailyBarSeries>,
        daily_failures: HashSet<String>,
        intraday: Mutex<HashMap<String, Vec<f64>>>,
        intraday_down: AtomicBool,
        pub daily_calls: AtomicUsize,
        pub intraday_calls: AtomicUsize,
        pub batch_calls: AtomicUsize,
    }

    impl StubSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_daily(mut self, ticker: &str, bars: DailyBarSeries) -> Self {
            self.daily.insert(ticker.to_string(), bars);
            self
        }

        pub fn with_daily_failure(mut self, ticker: &str) -> Self {
            self.daily_failures.insert(ticker.to_string());
            self
        }

        pub fn with_closes(self, ticker: &str, closes: &[f64]) -> Self {
            self.set_closes(ticker, closes);
            self
        }

        pub fn set_closes(&self, ticker: &str, closes: &[f64]) {
            if let Ok(mut map) = self.intraday.lock() {
                map.insert(ticker.to_string(), closes.to_vec());
            }
        }

        pub fn set_intraday_down(&self, down: bool) {
            self.intraday_down.store(down, Ordering::SeqCst);
        }

        pub fn calls(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn daily_bars(
            &self,
            ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<DailyBarSeries, FetchError> {
            self.daily_calls.fetch_add(1, Ordering::SeqCst);
            if self.daily_failures.contains(ticker) {
                return Err(FetchError::Status(500));
            }
            Ok(self.daily.get(ticker).cloned().unwrap_or_default())
        }

        async fn intraday_bars(
            &self,
            ticker: &str,
            _lookback: &str,
            _interval: &str,
        ) -> Result<Vec<IntradayBar>, FetchError> {
            self.intraday_calls.fetch_add(1, Ordering::SeqCst);
            if self.intraday_down.load(Ordering::SeqCst) {
                return Err(FetchError::Status(503));
            }
            let closes = self
                .intraday
                .lock()
                .ok()
                .and_then(|map| map.get(ticker).cloned())
                .ok_or_else(|| FetchError::NoData(ticker.to_string()))?;
            let start = Utc::now();
            Ok(closes
                .into_iter()
                .enumerate()
                .map(|(i, close)| IntradayBar {
                    time: start + chrono::Duration::minutes(i as i64),
                    close,
                })
                .collect())
        }

        async fn batch_intraday_closes(
            &self,
            tickers: &[String],
            _lookback: &str,
            _interval: &str,
        ) -> Result<BatchCloses, FetchError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            if self.intraday_down.load(Ordering::SeqCst) {
                return Err(FetchError::Status(503));
            }
            let map = self
                .intraday
                .lock()
                .map_err(|_| FetchError::Provider("stub poisoned".to_string()))?;
            Ok(tickers
                .iter()
                .filter_map(|t| map.get(t).map(|c| (t.clone(), c.clone())))
                .collect())
        }
    }
}
