//! Error taxonomy for pipeline stages.

use thiserror::Error;

/// Failure of a single pipeline stage or collaborator call.
///
/// Whether an error is fatal is decided by the stage that observes it,
/// not by the variant: a `Storage` failure is fatal for the audio upload
/// and tolerated for the thumbnail upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("title generation failed: {0}")]
    Title(String),

    #[error("thumbnail generation failed: {0}")]
    Thumbnail(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StageError {
    /// Short machine-readable name of the variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::Extraction(_) => "extraction",
            StageError::Summarization(_) => "summarization",
            StageError::Title(_) => "title",
            StageError::Thumbnail(_) => "thumbnail",
            StageError::Synthesis(_) => "synthesis",
            StageError::Timeout(_) => "timeout",
            StageError::Storage(_) => "storage",
            StageError::Notification(_) => "notification",
            StageError::Persistence(_) => "persistence",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StageError::Timeout(_))
    }
}

pub type StageResult<T> = Result<T, StageError>;
