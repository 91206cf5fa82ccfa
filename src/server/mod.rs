pub mod api;
pub mod news;

use crate::error::AppError;
use crate::services::{BatchAnalysisStreamer, SharedNewsStore, SharedRefresher};
use crate::utils::get_public_dir;
use axum::{
    Json, Router,
    extract::FromRef,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub analysis: BatchAnalysisStreamer,
    pub live: SharedRefresher,
    pub news: SharedNewsStore,
}

// FromRef implementations to extract specific state components
impl FromRef<AppState> for BatchAnalysisStreamer {
    fn from_ref(app_state: &AppState) -> BatchAnalysisStreamer {
        app_state.analysis.clone()
    }
}

impl FromRef<AppState> for SharedRefresher {
    fn from_ref(app_state: &AppState) -> SharedRefresher {
        app_state.live.clone()
    }
}

impl FromRef<AppState> for SharedNewsStore {
    fn from_ref(app_state: &AppState) -> SharedNewsStore {
        app_state.news.clone()
    }
}

/// JSON `{"error": ...}` body with the given status
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        error_response(status, self.to_string())
    }
}

/// Install the global tracing subscriber (`RUST_LOG`, default `info`)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

/// Build the router with every route and layer
pub fn router(app_state: AppState, public_dir: PathBuf) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/run_analysis", get(api::run_analysis_stream_handler))
        .route("/download_csv", get(api::download_csv_handler))
        .route("/run-analysis", get(api::run_analysis_handler))
        .route("/api/analysis_summary", get(api::analysis_summary_handler))
        .route("/api/index_snapshot", get(api::index_snapshot_handler))
        .route("/api/ticker_tape", get(api::ticker_tape_handler))
        .route("/api/nifty_data", get(api::nifty_data_handler))
        .route("/api/news", get(news::list_news_handler))
        .route("/api/news/{id}", get(news::get_news_handler))
        .route("/like/{id}", post(news::like_handler))
        .route("/api/sidebar", get(news::sidebar_handler))
        .route("/health", get(api::health_handler))
        .nest_service("/static", ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the axum server; tracing must already be initialised
pub async fn serve(app_state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting niftydash server");

    let public_dir = get_public_dir();
    tracing::info!("Using public directory: {}", public_dir.display());

    tracing::info!("Registering routes:");
    tracing::info!("  GET  /api/run_analysis?start=2008-01-01 (NDJSON stream)");
    tracing::info!("  GET  /download_csv?start=2008-01-01");
    tracing::info!("  GET  /run-analysis?start=2008-01-01");
    tracing::info!("  GET  /api/analysis_summary?start=2008-01-01");
    tracing::info!("  GET  /api/index_snapshot");
    tracing::info!("  GET  /api/ticker_tape");
    tracing::info!("  GET  /api/nifty_data");
    tracing::info!("  GET  /api/news, /api/news/{{id}}");
    tracing::info!("  POST /like/{{id}}");
    tracing::info!("  GET  /api/sidebar");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /static/* (static files from {})", public_dir.display());

    let app = router(app_state, public_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
