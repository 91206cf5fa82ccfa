use crate::models::SignalSummary;
use crate::server::error_response;
use crate::services::csv_export::{export_file_name, metrics_to_csv};
use crate::services::trading_hours::get_cache_max_age;
use crate::services::{BatchAnalysisStreamer, SharedRefresher};
use crate::utils::parse_start_date;
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    },
    response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDate};
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use tracing::{debug, info, instrument, warn};

/// Query parameters shared by the analysis endpoints
#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    /// First day of the analysis window (YYYY-MM-DD); defaults to 2008-01-01
    pub start: Option<String>,
}

impl AnalysisQuery {
    fn start_date(&self) -> Result<NaiveDate, Response> {
        parse_start_date(self.start.as_deref()).map_err(|e| {
            warn!(start = ?self.start, error = %e, "Rejected analysis start date");
            error_response(
                StatusCode::BAD_REQUEST,
                format!(
                    "Invalid start date '{}': expected YYYY-MM-DD",
                    self.start.as_deref().unwrap_or_default()
                ),
            )
        })
    }
}

/// GET /api/run_analysis - per-ticker progress as newline-delimited JSON
///
/// One `stock` event per universe ticker followed by a single `done` event.
/// Events are written as each ticker completes; nothing is buffered.
#[instrument(skip(streamer))]
pub async fn run_analysis_stream_handler(
    State(streamer): State<BatchAnalysisStreamer>,
    Query(params): Query<AnalysisQuery>,
) -> Response {
    let start = match params.start_date() {
        Ok(date) => date,
        Err(response) => return response,
    };
    info!(%start, total = streamer.total(), "Streaming analysis");

    let events = streamer
        .run(start)
        .map(|event| Ok::<_, Infallible>(event.to_ndjson()));

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CACHE_CONTROL, "no-cache"),
            (X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        Body::from_stream(events),
    )
        .into_response()
}

/// GET /download_csv - the full analysis as a CSV attachment
#[instrument(skip(streamer))]
pub async fn download_csv_handler(
    State(streamer): State<BatchAnalysisStreamer>,
    Query(params): Query<AnalysisQuery>,
) -> Response {
    let start = match params.start_date() {
        Ok(date) => date,
        Err(response) => return response,
    };

    let metrics = streamer.collect(start).await;
    let csv = match metrics_to_csv(&metrics) {
        Ok(bytes) => bytes,
        Err(e) => return e.into_response(),
    };

    let filename = export_file_name(Local::now().naive_local());
    info!(rows = metrics.len(), bytes = csv.len(), %filename, "CSV export ready");

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response()
}

/// GET /run-analysis - the full analysis as a JSON array
#[instrument(skip(streamer))]
pub async fn run_analysis_handler(
    State(streamer): State<BatchAnalysisStreamer>,
    Query(params): Query<AnalysisQuery>,
) -> Response {
    match params.start_date() {
        Ok(start) => Json(streamer.collect(start).await).into_response(),
        Err(response) => response,
    }
}

/// GET /api/analysis_summary - BUY/SELL counts over the full analysis
#[instrument(skip(streamer))]
pub async fn analysis_summary_handler(
    State(streamer): State<BatchAnalysisStreamer>,
    Query(params): Query<AnalysisQuery>,
) -> Response {
    let start = match params.start_date() {
        Ok(date) => date,
        Err(response) => return response,
    };
    let summary = SignalSummary::from_metrics(&streamer.collect(start).await);
    debug!(buy = summary.buy, sell = summary.sell, "Analysis summary");
    Json(summary).into_response()
}

fn live_cache_header(live: &SharedRefresher) -> [(axum::http::HeaderName, String); 1] {
    let max_age = get_cache_max_age(live.market_open());
    [(CACHE_CONTROL, format!("max-age={}", max_age))]
}

/// GET /api/index_snapshot
#[instrument(skip(live))]
pub async fn index_snapshot_handler(State(live): State<SharedRefresher>) -> impl IntoResponse {
    let snapshot = live.get_snapshot().await;
    (StatusCode::OK, live_cache_header(&live), Json(snapshot))
}

/// GET /api/ticker_tape
#[instrument(skip(live))]
pub async fn ticker_tape_handler(State(live): State<SharedRefresher>) -> impl IntoResponse {
    let tape = live.get_ticker_tape().await;
    (StatusCode::OK, live_cache_header(&live), Json(tape))
}

/// GET /api/nifty_data - one year of daily Nifty bars in columnar form
#[instrument(skip(live))]
pub async fn nifty_data_handler(State(live): State<SharedRefresher>) -> impl IntoResponse {
    Json(live.index_chart().await)
}

/// GET /health
pub async fn health_handler(State(live): State<SharedRefresher>) -> impl IntoResponse {
    let (index_snapshot, ticker_tape) = live.phases().await;
    Json(serde_json::json!({
        "status": "ok",
        "market_open": live.market_open(),
        "caches": {
            "index_snapshot": index_snapshot.to_string(),
            "ticker_tape": ticker_tape.to_string(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use crate::constants::{NIFTY_SYMBOL, SENSEX_SYMBOL};
    use crate::models::Ohlcv;
    use crate::server::testing::{app, get_json, send};
    use crate::services::market_data::testing::StubSource;
    use axum::http::StatusCode;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn bars(up_days: usize, down_days: usize) -> Vec<Ohlcv> {
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut series = Vec::new();
        for _ in 0..up_days {
            series.push(Ohlcv::new(time, 100.0, 101.0, 100.0, 100.5, 1));
        }
        for _ in 0..down_days {
            series.push(Ohlcv::new(time, 100.0, 100.0, 99.0, 99.5, 1));
        }
        series
    }

    fn analysis_source() -> StubSource {
        StubSource::new()
            .with_daily("AAA.NS", bars(3, 1))
            .with_daily_failure("BBB.NS")
            .with_daily("CCC.NS", bars(1, 3))
    }

    #[tokio::test]
    async fn test_stream_is_ndjson_with_done_last() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(analysis_source(), false, dir.path());

        let (status, headers, body) = send(&app, "GET", "/api/run_analysis?start=2020-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "text/plain; charset=utf-8");
        assert_eq!(headers["cache-control"], "no-cache");
        assert_eq!(headers["x-content-type-options"], "nosniff");

        let text = String::from_utf8(body).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["type"], "stock");
        assert_eq!(lines[0]["data"]["Ticker"], "AAA");
        assert_eq!(lines[0]["data"]["Signal"], "BUY");
        assert!(lines[1]["data"].is_null());
        assert_eq!(lines[1]["index"], 1);
        assert_eq!(lines[2]["total"], 3);
        assert_eq!(lines[3], serde_json::json!({"type": "done"}));
    }

    #[tokio::test]
    async fn test_invalid_start_is_rejected_before_fetching() {
        let dir = TempDir::new().unwrap();
        let (app, source) = app(analysis_source(), false, dir.path());

        for uri in [
            "/api/run_analysis?start=yesterday",
            "/download_csv?start=2024-13-01",
            "/run-analysis?start=01-01-2020",
            "/api/analysis_summary?start=",
        ] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
        }
        assert_eq!(StubSource::calls(&source.daily_calls), 0);
    }

    #[tokio::test]
    async fn test_download_csv_attachment() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(analysis_source(), false, dir.path());

        let (status, headers, body) = send(&app, "GET", "/download_csv").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "text/csv; charset=utf-8");
        let disposition = headers["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"nifty_50_analysis_"));
        assert!(disposition.ends_with(".csv\""));

        let text = String::from_utf8(body).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 3, "header plus two tickers with data");
        assert!(rows[1].starts_with("AAA,"));
        assert!(rows[1].ends_with(",BUY"));
        assert!(rows[2].starts_with("CCC,"));
        assert!(rows[2].ends_with(",SELL"));
    }

    #[tokio::test]
    async fn test_run_analysis_json_and_summary() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(analysis_source(), false, dir.path());

        let (status, body) = get_json(&app, "/run-analysis").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["High>Open%"], 75.0);
        assert_eq!(rows[0]["Low<Open%"], 25.0);

        let (_, summary) = get_json(&app, "/api/analysis_summary").await;
        assert_eq!(summary, serde_json::json!({"buy": 1, "sell": 1}));
    }

    #[tokio::test]
    async fn test_snapshot_when_closed() {
        let dir = TempDir::new().unwrap();
        let (app, source) = app(StubSource::new(), false, dir.path());

        let (status, headers, body) = send(&app, "GET", "/api/index_snapshot").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["cache-control"], "max-age=120");
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "Sensex": "Market Closed",
                "Nifty": "Market Closed",
                "USD/INR": "83.25",
            })
        );

        let (_, tape) = get_json(&app, "/api/ticker_tape").await;
        assert_eq!(tape, serde_json::json!([]));
        assert_eq!(StubSource::calls(&source.intraday_calls), 0);
    }

    #[tokio::test]
    async fn test_live_widgets_when_open() {
        let dir = TempDir::new().unwrap();
        let source = StubSource::new()
            .with_closes(SENSEX_SYMBOL, &[74000.0, 74100.0])
            .with_closes(NIFTY_SYMBOL, &[22500.0, 22450.25])
            .with_closes("AAA.NS", &[100.0, 99.5])
            .with_closes("CCC.NS", &[20.0, 20.0]);
        let (app, _) = app(source, true, dir.path());

        let (_, headers, body) = send(&app, "GET", "/api/index_snapshot").await;
        assert_eq!(headers["cache-control"], "max-age=15");
        let snapshot: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(snapshot["Sensex"], "74100.00 ▲ 100.00");
        assert_eq!(snapshot["Nifty"], "22450.25 ▼ 49.75");

        let (_, tape) = get_json(&app, "/api/ticker_tape").await;
        assert_eq!(
            tape,
            serde_json::json!([
                {"symbol": "AAA", "price": 99.5, "change": -0.5, "arrow": "▼", "color": "red"},
                {"symbol": "CCC", "price": 20.0, "change": 0.0, "arrow": "⏺", "color": "white"},
            ])
        );

        let (_, health) = get_json(&app, "/health").await;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["market_open"], true);
        assert_eq!(health["caches"]["index_snapshot"], "fresh");
        assert_eq!(health["caches"]["ticker_tape"], "fresh");
    }

    #[tokio::test]
    async fn test_nifty_data_is_columnar_and_never_fails() {
        let dir = TempDir::new().unwrap();
        let (router, _) = app(
            StubSource::new().with_daily(NIFTY_SYMBOL, bars(2, 0)),
            false,
            dir.path(),
        );
        let (status, body) = get_json(&router, "/api/nifty_data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date"], serde_json::json!(["2024-01-02", "2024-01-02"]));
        assert_eq!(body["close"], serde_json::json!([100.5, 100.5]));

        let (router, _) = app(
            StubSource::new().with_daily_failure(NIFTY_SYMBOL),
            false,
            dir.path(),
        );
        let (status, body) = get_json(&router, "/api/nifty_data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["volume"], serde_json::json!([]));
    }
}
