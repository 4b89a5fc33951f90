//! Article repository: creation, lookup and the per-stage writes.

use chrono::{DateTime, Utc};
use scribe_core::{Article, ArticleId, ArticleStatus, Format, Length, StatusChange};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::{DbError, get_db};

/// Repository for article persistence operations.
pub struct ArticleRepository;

/// Internal record type for SurrealDB reads.
#[derive(Debug, Deserialize)]
struct ArticleRecord {
    id: Option<Thing>,
    owner_id: String,
    url: String,
    format: Format,
    length: Length,
    language: Option<String>,
    style: Option<String>,
    status: ArticleStatus,
    title: Option<String>,
    original_content: Option<String>,
    summary: Option<String>,
    thumbnail_path: Option<String>,
    audio_file_path: Option<String>,
    video_file_path: Option<String>,
    duration_seconds: Option<u32>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ArticleRecord {
    fn record_id(&self) -> Option<ArticleId> {
        self.id
            .as_ref()
            .and_then(|t| ArticleId::parse(&t.id.to_raw()).ok())
    }

    fn into_article(self, id: ArticleId) -> Article {
        Article {
            id,
            owner_id: self.owner_id,
            url: self.url,
            format: self.format,
            length: self.length,
            language: self.language,
            style: self.style,
            status: self.status,
            title: self.title,
            original_content: self.original_content,
            summary: self.summary,
            thumbnail_path: self.thumbnail_path,
            audio_file_path: self.audio_file_path,
            video_file_path: self.video_file_path,
            duration_seconds: self.duration_seconds,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Struct for creating articles - omits datetime fields to use SurrealDB defaults.
#[derive(Debug, Clone, Serialize)]
struct ArticleCreate {
    owner_id: String,
    url: String,
    format: Format,
    length: Length,
    language: Option<String>,
    style: Option<String>,
    status: ArticleStatus,
}

/// Filter options for listing articles.
#[derive(Debug, Default, Clone)]
pub struct ArticleFilter {
    pub owner_id: Option<String>,
    pub status: Option<ArticleStatus>,
    pub limit: Option<usize>,
}

impl ArticleRepository {
    /// Insert a new article. Articles always start out `queued`.
    pub async fn create(article: &Article) -> Result<Article, DbError> {
        let db = get_db()?;

        let create_data = ArticleCreate {
            owner_id: article.owner_id.clone(),
            url: article.url.clone(),
            format: article.format,
            length: article.length,
            language: article.language.clone(),
            style: article.style.clone(),
            status: ArticleStatus::Queued,
        };

        let record: Option<ArticleRecord> = db
            .create(("article", article.id.to_string()))
            .content(create_data)
            .await?;

        record
            .map(|r| r.into_article(article.id))
            .ok_or_else(|| DbError::Query("Failed to create article".into()))
    }

    /// Get an article by ID.
    pub async fn get(id: ArticleId) -> Result<Article, DbError> {
        let db = get_db()?;

        let record: Option<ArticleRecord> = db.select(("article", id.to_string())).await?;

        record
            .map(|r| r.into_article(id))
            .ok_or_else(|| DbError::NotFound(format!("Article not found: {}", id)))
    }

    /// List articles, newest first.
    pub async fn list(filter: ArticleFilter) -> Result<Vec<Article>, DbError> {
        let db = get_db()?;

        let mut conditions = Vec::new();
        let mut bindings: Vec<(&'static str, serde_json::Value)> = Vec::new();

        if let Some(owner_id) = &filter.owner_id {
            conditions.push("owner_id = $owner_id");
            bindings.push(("owner_id", serde_json::json!(owner_id)));
        }

        if let Some(status) = filter.status {
            conditions.push("status = $status");
            bindings.push(("status", serde_json::json!(status.as_str())));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit_clause = filter
            .limit
            .map(|l| format!("LIMIT {}", l))
            .unwrap_or_default();

        let query = format!(
            "SELECT * FROM article {} ORDER BY created_at DESC {}",
            where_clause, limit_clause
        );

        let mut result = db.query(&query);

        for (name, value) in bindings {
            result = result.bind((name, value));
        }

        let mut response = result.await?;
        let records: Vec<ArticleRecord> = response.take(0)?;

        Ok(records
            .into_iter()
            .filter_map(|r| r.record_id().map(|id| r.into_article(id)))
            .collect())
    }

    /// Write a lifecycle transition.
    ///
    /// The transition is validated against the stored status first. Callers
    /// must not process the same article concurrently: the read and the
    /// write are not atomic.
    pub async fn update_status(id: ArticleId, change: &StatusChange) -> Result<Article, DbError> {
        let mut article = Self::get(id).await?;
        article.apply_status(change, Utc::now())?;

        let db = get_db()?;
        let mut result = db
            .query(
                "UPDATE type::thing('article', $id) SET status = $status, error_message = $error_message, updated_at = time::now() RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("status", change.status()))
            .bind(("error_message", change.error_message().map(str::to_string)))
            .await?;

        Self::take_one(id, &mut result)
    }

    /// Store the extracted text and the summary.
    pub async fn save_content(
        id: ArticleId,
        original_content: &str,
        summary: &str,
    ) -> Result<Article, DbError> {
        let db = get_db()?;
        let mut result = db
            .query(
                "UPDATE type::thing('article', $id) SET original_content = $original_content, summary = $summary, updated_at = time::now() RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("original_content", original_content.to_string()))
            .bind(("summary", summary.to_string()))
            .await?;

        Self::take_one(id, &mut result)
    }

    pub async fn save_title(id: ArticleId, title: &str) -> Result<Article, DbError> {
        Self::set_path(id, "title", title).await
    }

    pub async fn save_thumbnail(id: ArticleId, url: &str) -> Result<Article, DbError> {
        Self::set_path(id, "thumbnail_path", url).await
    }

    pub async fn save_audio(id: ArticleId, url: &str) -> Result<Article, DbError> {
        Self::set_path(id, "audio_file_path", url).await
    }

    /// Store the video location together with its duration.
    pub async fn save_video(
        id: ArticleId,
        url: &str,
        duration_seconds: u32,
    ) -> Result<Article, DbError> {
        let db = get_db()?;
        let mut result = db
            .query(
                "UPDATE type::thing('article', $id) SET video_file_path = $url, duration_seconds = $duration, updated_at = time::now() RETURN AFTER",
            )
            .bind(("id", id.to_string()))
            .bind(("url", url.to_string()))
            .bind(("duration", duration_seconds as i64))
            .await?;

        Self::take_one(id, &mut result)
    }

    /// Delete an article.
    pub async fn delete(id: ArticleId) -> Result<(), DbError> {
        let db = get_db()?;

        let deleted: Option<ArticleRecord> = db.delete(("article", id.to_string())).await?;

        deleted
            .map(|_| ())
            .ok_or_else(|| DbError::NotFound(format!("Article not found: {}", id)))
    }

    /// Single string field update. `field` is always one of the fixed column names above.
    async fn set_path(id: ArticleId, field: &'static str, value: &str) -> Result<Article, DbError> {
        let db = get_db()?;
        let query = format!(
            "UPDATE type::thing('article', $id) SET {} = $value, updated_at = time::now() RETURN AFTER",
            field
        );
        let mut result = db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("value", value.to_string()))
            .await?;

        Self::take_one(id, &mut result)
    }

    fn take_one(id: ArticleId, result: &mut surrealdb::Response) -> Result<Article, DbError> {
        let records: Vec<ArticleRecord> = result.take(0)?;

        records
            .into_iter()
            .next()
            .map(|r| r.into_article(id))
            .ok_or_else(|| DbError::NotFound(format!("Article not found: {}", id)))
    }
}
