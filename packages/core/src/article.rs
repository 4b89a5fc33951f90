//! Article domain types: the persisted record the pipeline works on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for an article, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub Ulid);

impl ArticleId {
    /// Create a new unique article ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse an article ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output format requested for an article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Audio,
    Video,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Audio => "audio",
            Format::Video => "video",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "audio" => Ok(Format::Audio),
            "video" => Ok(Format::Video),
            other => Err(format!("format must be 'text', 'audio' or 'video', got '{other}'")),
        }
    }
}

/// Requested summary length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Length {
    #[serde(rename = "s")]
    Short,
    #[default]
    #[serde(rename = "m")]
    Medium,
    #[serde(rename = "l")]
    Long,
}

impl Length {
    /// The single-letter code stored in the database.
    pub fn code(self) -> &'static str {
        match self {
            Length::Short => "s",
            Length::Medium => "m",
            Length::Long => "l",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "s" => Some(Length::Short),
            "m" => Some(Length::Medium),
            "l" => Some(Length::Long),
            _ => None,
        }
    }

    /// Target duration of a generated video.
    pub fn video_duration_secs(self) -> u32 {
        match self {
            Length::Short => 10,
            Length::Medium => 30,
            Length::Long => 60,
        }
    }
}

impl std::fmt::Display for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Length {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Length::from_code(s).ok_or_else(|| format!("length must be 's', 'm' or 'l', got '{s}'"))
    }
}

/// Lifecycle status of an article.
///
/// `Queued -> Processing -> Ready | Failed`. `Ready` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Queued,
    Processing,
    Ready,
    Failed,
}

impl ArticleStatus {
    /// Check if the article is in a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, ArticleStatus::Ready | ArticleStatus::Failed)
    }

    /// Whether `next` may follow `self`. Re-issuing the current status is allowed.
    pub fn can_transition_to(self, next: ArticleStatus) -> bool {
        use ArticleStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Queued, Processing) | (Processing, Ready) | (Processing, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Queued => "queued",
            ArticleStatus::Processing => "processing",
            ArticleStatus::Ready => "ready",
            ArticleStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(ArticleStatus::Queued),
            "processing" => Ok(ArticleStatus::Processing),
            "ready" => Ok(ArticleStatus::Ready),
            "failed" => Ok(ArticleStatus::Failed),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// A requested status write. `error_message` is present only for `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    status: ArticleStatus,
    error_message: Option<String>,
}

impl StatusChange {
    pub fn processing() -> Self {
        Self {
            status: ArticleStatus::Processing,
            error_message: None,
        }
    }

    pub fn ready() -> Self {
        Self {
            status: ArticleStatus::Ready,
            error_message: None,
        }
    }

    /// An empty message is replaced so that a failed article always explains itself.
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        };
        Self {
            status: ArticleStatus::Failed,
            error_message: Some(message),
        }
    }

    pub fn status(&self) -> ArticleStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Rejected status write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status transition {from} -> {to}")]
pub struct TransitionError {
    pub from: ArticleStatus,
    pub to: ArticleStatus,
}

/// An article submitted for processing, with every artifact the pipeline derives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier for this article.
    pub id: ArticleId,
    /// Owner reference. Carried, never interpreted by the pipeline.
    pub owner_id: String,
    /// Source URL.
    pub url: String,
    pub format: Format,
    pub length: Length,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub status: ArticleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the article was created.
    pub created_at: DateTime<Utc>,
    /// When the article was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Create a new queued article.
    pub fn new(
        owner_id: impl Into<String>,
        url: impl Into<String>,
        format: Format,
        length: Length,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ArticleId::new(),
            owner_id: owner_id.into(),
            url: url.into(),
            format,
            length,
            language: None,
            style: None,
            status: ArticleStatus::Queued,
            title: None,
            original_content: None,
            summary: None,
            thumbnail_path: None,
            audio_file_path: None,
            video_file_path: None,
            duration_seconds: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the language preference.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the style preference.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Apply a status write, enforcing the lifecycle rules.
    ///
    /// A repeated status only refreshes `updated_at`. A repeated `Failed`
    /// must carry the message already recorded.
    pub fn apply_status(
        &mut self,
        change: &StatusChange,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        let next = change.status();
        let rejected = TransitionError {
            from: self.status,
            to: next,
        };

        if !self.status.can_transition_to(next) {
            return Err(rejected);
        }
        if self.status == next && self.error_message.as_deref() != change.error_message() {
            return Err(rejected);
        }

        self.status = next;
        self.error_message = change.error_message.clone();
        self.updated_at = now;
        Ok(())
    }

    /// Video duration derived from the requested length.
    pub fn video_duration_secs(&self) -> u32 {
        self.length.video_duration_secs()
    }
}
