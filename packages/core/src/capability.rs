//! Contracts for the collaborators the pipeline depends on.
//!
//! Every trait is object safe so implementations can be injected as
//! `Arc<dyn Trait>`; methods return a boxed [`CapabilityFuture`].

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::article::{Article, ArticleId, Length, StatusChange};
use crate::error::StageResult;
use crate::events::Notification;

/// Future type returned by every capability.
pub type CapabilityFuture<'a, T> = Pin<Box<dyn Future<Output = StageResult<T>> + Send + 'a>>;

/// Clean article text plus its summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub full_text: String,
    pub summary: String,
}

/// Fetches an article and summarizes it.
pub trait Summarizer: Send + Sync + 'static {
    /// Fails with `StageError::Extraction` or `StageError::Summarization`.
    fn summarize<'a>(
        &'a self,
        url: &'a str,
        length: Length,
        language: &'a str,
        style: &'a str,
    ) -> CapabilityFuture<'a, Summary>;
}

/// Produces a short title for article content.
pub trait TitleGenerator: Send + Sync + 'static {
    fn generate_title<'a>(&'a self, content: &'a str) -> CapabilityFuture<'a, String>;
}

/// Produces thumbnail image bytes (PNG) for a summary.
pub trait ThumbnailGenerator: Send + Sync + 'static {
    fn generate_thumbnail<'a>(&'a self, summary: &'a str) -> CapabilityFuture<'a, Vec<u8>>;
}

/// Converts text to speech (MP3 bytes).
pub trait AudioSynthesizer: Send + Sync + 'static {
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
        language: Option<&'a str>,
        style: Option<&'a str>,
    ) -> CapabilityFuture<'a, Vec<u8>>;
}

/// Generates a video remotely and fetches it.
pub trait VideoSynthesizer: Send + Sync + 'static {
    /// Returns the remote URL of the finished video.
    ///
    /// Fails with `StageError::Synthesis` or `StageError::Timeout`.
    fn generate<'a>(&'a self, prompt: &'a str, duration_secs: u32)
    -> CapabilityFuture<'a, String>;

    /// Downloads the video to a uniquely named local file and returns its path.
    fn download<'a>(
        &'a self,
        video_url: &'a str,
        article_id: ArticleId,
    ) -> CapabilityFuture<'a, PathBuf>;
}

/// Durable artifact storage.
pub trait ArtifactStore: Send + Sync + 'static {
    /// Upload bytes under `key` and return the durable URL.
    fn upload<'a>(
        &'a self,
        key: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> CapabilityFuture<'a, String>;
}

/// Best-effort notification delivery.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification) -> CapabilityFuture<'_, ()>;
}

/// Persistence contract for the article record.
///
/// Each method is a single independently committed write. There is no
/// transaction spanning stages, so readers can observe partial progress.
pub trait ArticleStore: Send + Sync + 'static {
    fn load(&self, id: ArticleId) -> CapabilityFuture<'_, Article>;

    fn set_status(&self, id: ArticleId, change: StatusChange) -> CapabilityFuture<'_, ()>;

    fn save_content<'a>(
        &'a self,
        id: ArticleId,
        original_content: &'a str,
        summary: &'a str,
    ) -> CapabilityFuture<'a, ()>;

    fn save_title<'a>(&'a self, id: ArticleId, title: &'a str) -> CapabilityFuture<'a, ()>;

    fn save_thumbnail<'a>(&'a self, id: ArticleId, url: &'a str) -> CapabilityFuture<'a, ()>;

    fn save_audio<'a>(&'a self, id: ArticleId, url: &'a str) -> CapabilityFuture<'a, ()>;

    fn save_video<'a>(
        &'a self,
        id: ArticleId,
        url: &'a str,
        duration_seconds: u32,
    ) -> CapabilityFuture<'a, ()>;
}
