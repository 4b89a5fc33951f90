//! Runs one article through every processing stage.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use scribe_core::artifact;
use scribe_core::{
    Article, ArticleId, ArticleStore, Format, Notification, StageError, StatusChange,
};
use tracing::{debug, error, info, warn};

use crate::Capabilities;

pub const FALLBACK_TITLE: &str = "Untitled Article";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_STYLE: &str = "summarize";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Title used when title generation fails.
    pub fallback_title: String,
    pub default_language: String,
    pub default_style: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_title: FALLBACK_TITLE.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            default_style: DEFAULT_STYLE.to_string(),
        }
    }
}

/// A fatal stage failure: the short reason sent to the user and the full error.
#[derive(Debug)]
struct Failure {
    reason: &'static str,
    detail: String,
}

impl Failure {
    fn new(reason: &'static str, err: impl std::fmt::Display) -> Self {
        Self {
            reason,
            detail: err.to_string(),
        }
    }

    fn message(&self) -> String {
        format!("{}: {}", self.reason, self.detail)
    }
}

/// Sequences the capability calls for an article and records the outcome.
///
/// Every stage result is written to the store as soon as it is available, so
/// a reader can observe partial progress. Each article id must be processed
/// at most once at a time; concurrent runs on the same id can interleave
/// their writes.
#[derive(Clone)]
pub struct ArticlePipeline {
    store: Arc<dyn ArticleStore>,
    caps: Capabilities,
    config: PipelineConfig,
}

impl ArticlePipeline {
    pub fn new(store: Arc<dyn ArticleStore>, caps: Capabilities) -> Self {
        Self::with_config(store, caps, PipelineConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn ArticleStore>,
        caps: Capabilities,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            caps,
            config,
        }
    }

    /// Process an article to `ready` or `failed`.
    ///
    /// Nothing is returned: the outcome is on the stored article.
    pub async fn process(&self, id: ArticleId) {
        let started = Instant::now();
        info!(article_id = %id, "Processing article");

        if let Err(e) = self.store.set_status(id, StatusChange::processing()).await {
            error!(article_id = %id, error = %e, "Failed to mark article as processing");
            return;
        }

        match self.run(id).await {
            Ok(title) => self.complete(id, title).await,
            Err(failure) => self.fail(id, failure).await,
        }

        debug!(
            article_id = %id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Article processing finished"
        );
    }

    /// Every stage up to, but not including, the `ready` transition.
    async fn run(&self, id: ArticleId) -> Result<String, Failure> {
        let article = self
            .store
            .load(id)
            .await
            .map_err(|e| Failure::new("Failed to load article", e))?;

        let language =
            non_empty(article.language.as_deref()).unwrap_or(self.config.default_language.as_str());
        let style = non_empty(article.style.as_deref()).unwrap_or(self.config.default_style.as_str());

        info!(
            article_id = %id,
            format = %article.format,
            length = %article.length,
            language,
            style,
            "Summarizing article"
        );
        let summary = self
            .caps
            .summarizer
            .summarize(&article.url, article.length, language, style)
            .await
            .map_err(|e| Failure::new("Failed to summarize", e))?;

        self.store
            .save_content(id, &summary.full_text, &summary.summary)
            .await
            .map_err(|e| Failure::new("Failed to save summary", e))?;

        let title = self.title(id, &summary.full_text).await;
        if let Err(e) = self.store.save_title(id, &title).await {
            warn!(article_id = %id, error = %e, "Failed to save title");
        }

        self.thumbnail(id, &summary.summary).await;

        match article.format {
            Format::Text => {}
            Format::Audio => self.audio(&article, &summary.summary).await?,
            Format::Video => self.video(&article, &summary.summary).await?,
        }

        Ok(title)
    }

    async fn title(&self, id: ArticleId, content: &str) -> String {
        match self.caps.title_generator.generate_title(content).await {
            Ok(title) => {
                info!(article_id = %id, %title, "Generated title");
                title
            }
            Err(e) => {
                warn!(article_id = %id, error = %e, "Title generation failed, using fallback");
                self.config.fallback_title.clone()
            }
        }
    }

    /// Thumbnail failures never fail the article.
    async fn thumbnail(&self, id: ArticleId, summary: &str) {
        match self.store_thumbnail(id, summary).await {
            Ok(url) => info!(article_id = %id, %url, "Stored thumbnail"),
            Err(e) => warn!(article_id = %id, error = %e, kind = e.kind(), "Skipping thumbnail"),
        }
    }

    async fn store_thumbnail(&self, id: ArticleId, summary: &str) -> Result<String, StageError> {
        let image = self.caps.thumbnail_generator.generate_thumbnail(summary).await?;
        let url = self
            .caps
            .artifacts
            .upload(&artifact::thumbnail_key(id), image, artifact::PNG)
            .await?;
        self.store.save_thumbnail(id, &url).await?;
        Ok(url)
    }

    async fn audio(&self, article: &Article, summary: &str) -> Result<(), Failure> {
        info!(article_id = %article.id, "Converting summary to speech");

        let audio = self
            .caps
            .audio
            .synthesize(summary, article.language.as_deref(), article.style.as_deref())
            .await
            .map_err(|e| Failure::new("Failed to convert to speech", e))?;

        let url = self
            .caps
            .artifacts
            .upload(&artifact::audio_key(article.id), audio, artifact::MPEG_AUDIO)
            .await
            .map_err(|e| Failure::new("Failed to upload audio", e))?;

        self.store
            .save_audio(article.id, &url)
            .await
            .map_err(|e| Failure::new("Failed to save audio path", e))?;

        info!(article_id = %article.id, %url, "Stored audio");
        Ok(())
    }

    async fn video(&self, article: &Article, summary: &str) -> Result<(), Failure> {
        let duration = article.video_duration_secs();
        info!(article_id = %article.id, duration, "Generating video");

        let video_url = self
            .caps
            .video
            .generate(summary, duration)
            .await
            .map_err(|e| Failure::new("Failed to generate video", e))?;

        let local = self
            .caps
            .video
            .download(&video_url, article.id)
            .await
            .map_err(|e| Failure::new("Failed to download video", e))?;

        let uploaded = self.upload_video(article.id, &local).await;
        if let Err(e) = tokio::fs::remove_file(&local).await {
            warn!(article_id = %article.id, path = %local.display(), error = %e, "Failed to remove downloaded video");
        }
        let url = uploaded.map_err(|e| Failure::new("Failed to upload video", e))?;

        self.store
            .save_video(article.id, &url, duration)
            .await
            .map_err(|e| Failure::new("Failed to save video path", e))?;

        info!(article_id = %article.id, %url, duration, "Stored video");
        Ok(())
    }

    async fn upload_video(&self, id: ArticleId, local: &Path) -> Result<String, StageError> {
        let bytes = tokio::fs::read(local)
            .await
            .map_err(|e| StageError::Storage(format!("failed to read {}: {e}", local.display())))?;

        self.caps
            .artifacts
            .upload(&artifact::video_key(id), bytes, artifact::MP4_VIDEO)
            .await
    }

    async fn complete(&self, id: ArticleId, title: String) {
        if let Err(e) = self.store.set_status(id, StatusChange::ready()).await {
            error!(article_id = %id, error = %e, "Failed to mark article as ready");
            // The article must not be left in processing.
            let fallback = StatusChange::failed(format!("Failed to mark article as ready: {e}"));
            if let Err(e) = self.store.set_status(id, fallback).await {
                error!(article_id = %id, error = %e, "Failed to mark article as failed");
            }
            return;
        }
        info!(article_id = %id, "Article ready");

        self.notify(Notification::ArticleReady {
            article_id: id,
            title,
        })
        .await;
    }

    async fn fail(&self, id: ArticleId, failure: Failure) {
        let message = failure.message();
        error!(article_id = %id, error = %message, "Article processing failed");

        if let Err(e) = self.store.set_status(id, StatusChange::failed(&message)).await {
            error!(article_id = %id, error = %e, "Failed to mark article as failed");
        }

        self.notify(Notification::ArticleFailed {
            article_id: id,
            reason: failure.reason.to_string(),
        })
        .await;
    }

    async fn notify(&self, notification: Notification) {
        let id = notification.article_id();
        if let Err(e) = self.caps.notifier.notify(notification).await {
            warn!(article_id = %id, error = %e, "Notification not delivered");
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
