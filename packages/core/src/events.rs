//! Notification payloads and processing events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ArticleId;

/// Outcome notification sent to the article owner when processing ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    /// The article reached `ready`.
    ArticleReady { article_id: ArticleId, title: String },
    /// The article reached `failed`.
    ArticleFailed {
        article_id: ArticleId,
        reason: String,
    },
}

impl Notification {
    pub fn article_id(&self) -> ArticleId {
        match self {
            Notification::ArticleReady { article_id, .. } => *article_id,
            Notification::ArticleFailed { article_id, .. } => *article_id,
        }
    }

    /// Alert headline shown to the user.
    pub fn headline(&self) -> &'static str {
        match self {
            Notification::ArticleReady { .. } => "Article Ready!",
            Notification::ArticleFailed { .. } => "Article Processing Failed",
        }
    }

    /// Alert body shown to the user.
    pub fn body(&self) -> String {
        match self {
            Notification::ArticleReady { title, .. } => {
                format!("Your article '{}' is ready to read", title)
            }
            Notification::ArticleFailed { .. } => {
                "There was an error processing your article".to_string()
            }
        }
    }
}

/// Events emitted by the processing pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProcessingEvent {
    /// An article was accepted for processing.
    Submitted {
        article_id: ArticleId,
        timestamp: DateTime<Utc>,
    },
    /// A worker picked up the article.
    Started {
        article_id: ArticleId,
        worker_id: String,
        timestamp: DateTime<Utc>,
    },
    /// The pipeline returned; the outcome is on the persisted article.
    Finished {
        article_id: ArticleId,
        worker_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl ProcessingEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ProcessingEvent::Submitted { timestamp, .. } => *timestamp,
            ProcessingEvent::Started { timestamp, .. } => *timestamp,
            ProcessingEvent::Finished { timestamp, .. } => *timestamp,
        }
    }

    pub fn article_id(&self) -> ArticleId {
        match self {
            ProcessingEvent::Submitted { article_id, .. } => *article_id,
            ProcessingEvent::Started { article_id, .. } => *article_id,
            ProcessingEvent::Finished { article_id, .. } => *article_id,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            ProcessingEvent::Submitted { article_id, .. } => {
                format!("Article {} submitted", article_id)
            }
            ProcessingEvent::Started {
                article_id,
                worker_id,
                ..
            } => format!("Article {} started by {}", article_id, worker_id),
            ProcessingEvent::Finished {
                article_id,
                duration_ms,
                ..
            } => format!("Article {} finished in {}ms", article_id, duration_ms),
        }
    }
}
