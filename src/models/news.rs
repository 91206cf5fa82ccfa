use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A news article as stored in the news file.
///
/// Only `id` is interpreted; every other field is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Article together with its current like count
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    pub article: NewsArticle,
    pub likes: u64,
}
