use crate::error::{AppError, Result};
use crate::models::{ArticleView, IndexSnapshot, NewsArticle};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// News feed, like counters and the sidebar blob.
///
/// Articles and the sidebar are re-read from disk on every call so edits to
/// the files show up without a restart. Likes live in memory only.
pub struct NewsStore {
    news_file: PathBuf,
    sidebar_file: PathBuf,
    likes: RwLock<HashMap<u64, u64>>,
}

pub type SharedNewsStore = Arc<NewsStore>;

impl NewsStore {
    pub fn new(news_file: PathBuf, sidebar_file: PathBuf) -> Self {
        info!(
            news = %news_file.display(),
            sidebar = %sidebar_file.display(),
            "News store configured"
        );
        Self {
            news_file,
            sidebar_file,
            likes: RwLock::new(HashMap::new()),
        }
    }

    pub async fn load_articles(&self) -> Result<Vec<NewsArticle>> {
        match read_optional(&self.news_file).await? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn articles(&self) -> Result<Vec<ArticleView>> {
        let articles = self.load_articles().await?;
        let likes = self.likes.read().await;
        Ok(articles
            .into_iter()
            .map(|article| ArticleView {
                likes: likes.get(&article.id).copied().unwrap_or(0),
                article,
            })
            .collect())
    }

    pub async fn article(&self, id: u64) -> Result<ArticleView> {
        let article = self
            .load_articles()
            .await?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("news article {}", id)))?;

        Ok(ArticleView {
            likes: self.likes(id).await,
            article,
        })
    }

    pub async fn likes(&self, id: u64) -> u64 {
        self.likes.read().await.get(&id).copied().unwrap_or(0)
    }

    /// Increment the like counter for `id` and return the new count.
    ///
    /// The id is not checked against the news file.
    pub async fn like(&self, id: u64) -> u64 {
        let mut likes = self.likes.write().await;
        let count = likes.entry(id).or_insert(0);
        *count += 1;
        debug!(id, likes = *count, "Article liked");
        *count
    }

    /// Sidebar blob with the index snapshot merged in under `"market"`
    pub async fn sidebar(&self, snapshot: &IndexSnapshot) -> Result<Value> {
        let mut sidebar = match read_optional(&self.sidebar_file).await? {
            Some(content) => match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                other => {
                    return Err(AppError::Parse(format!(
                        "sidebar must be a JSON object, got {}",
                        json_kind(&other)
                    )));
                }
            },
            None => Map::new(),
        };

        sidebar.insert("market".to_string(), serde_json::to_value(snapshot)?);
        Ok(Value::Object(sidebar))
    }
}

/// Read a file, treating a missing file as `None`
async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "File not found, using empty default");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> NewsStore {
        NewsStore::new(dir.path().join("news.json"), dir.path().join("sidebar.json"))
    }

    fn write_news(dir: &TempDir) {
        fs::write(
            dir.path().join("news.json"),
            r#"[{"id": 1, "title": "Sensex opens higher"}, {"id": 2, "title": "Rupee steady"}]"#,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_missing_news_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).articles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_article_lookup_and_likes() {
        let dir = TempDir::new().unwrap();
        write_news(&dir);
        let store = store(&dir);

        assert_eq!(store.like(2).await, 1);
        assert_eq!(store.like(2).await, 2);

        let view = store.article(2).await.unwrap();
        assert_eq!(view.article.fields["title"], "Rupee steady");
        assert_eq!(view.likes, 2);

        let all = store.articles().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].likes, 0);
    }

    #[tokio::test]
    async fn test_unknown_article_is_not_found() {
        let dir = TempDir::new().unwrap();
        write_news(&dir);
        assert!(matches!(
            store(&dir).article(99).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_news_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("news.json"), "{not json").unwrap();
        assert!(matches!(
            store(&dir).load_articles().await,
            Err(AppError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_sidebar_merges_market_snapshot() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sidebar.json"),
            r#"{"trending": ["RELIANCE"], "market": "stale"}"#,
        )
        .unwrap();
        let snapshot = IndexSnapshot::sentinel("Market Closed", "83.25");

        let sidebar = store(&dir).sidebar(&snapshot).await.unwrap();
        assert_eq!(sidebar["trending"][0], "RELIANCE");
        assert_eq!(sidebar["market"]["Nifty"], "Market Closed");
        assert_eq!(sidebar["market"]["USD/INR"], "83.25");
    }

    #[tokio::test]
    async fn test_missing_sidebar_only_has_market() {
        let dir = TempDir::new().unwrap();
        let snapshot = IndexSnapshot::sentinel("N/A", "83.25");

        let sidebar = store(&dir).sidebar(&snapshot).await.unwrap();
        let keys: Vec<&String> = sidebar.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["market"]);
    }

    #[tokio::test]
    async fn test_non_object_sidebar_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sidebar.json"), "[1, 2]").unwrap();
        let snapshot = IndexSnapshot::sentinel("N/A", "83.25");
        assert!(store(&dir).sidebar(&snapshot).await.is_err());
    }
}
