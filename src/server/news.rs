use crate::error::AppError;
use crate::models::ArticleView;
use crate::services::{SharedNewsStore, SharedRefresher};
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use tracing::{debug, instrument};

/// GET /api/news - every article with its like count
#[instrument(skip(news))]
pub async fn list_news_handler(
    State(news): State<SharedNewsStore>,
) -> Result<Json<Vec<ArticleView>>, AppError> {
    let articles = news.articles().await?;
    debug!(count = articles.len(), "Listing news");
    Ok(Json(articles))
}

/// GET /api/news/{id}
#[instrument(skip(news))]
pub async fn get_news_handler(
    State(news): State<SharedNewsStore>,
    Path(id): Path<u64>,
) -> Result<Json<ArticleView>, AppError> {
    Ok(Json(news.article(id).await?))
}

/// POST /like/{id}
#[instrument(skip(news))]
pub async fn like_handler(State(news): State<SharedNewsStore>, Path(id): Path<u64>) -> Json<Value> {
    let likes = news.like(id).await;
    Json(serde_json::json!({ "likes": likes }))
}

/// GET /api/sidebar - sidebar blob with the live index snapshot under `market`
#[instrument(skip(news, live))]
pub async fn sidebar_handler(
    State(news): State<SharedNewsStore>,
    State(live): State<SharedRefresher>,
) -> Result<Json<Value>, AppError> {
    let snapshot = live.get_snapshot().await;
    Ok(Json(news.sidebar(&snapshot).await?))
}
