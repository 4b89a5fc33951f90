//! `ArticleStore` backed by the article repository.

use scribe_core::{Article, ArticleId, ArticleStore, CapabilityFuture, StageError, StatusChange};

use crate::DbError;
use crate::repositories::ArticleRepository;

impl From<DbError> for StageError {
    fn from(err: DbError) -> Self {
        StageError::Persistence(err.to_string())
    }
}

impl ArticleStore for ArticleRepository {
    fn load(&self, id: ArticleId) -> CapabilityFuture<'_, Article> {
        Box::pin(async move { Ok(ArticleRepository::get(id).await?) })
    }

    fn set_status(&self, id: ArticleId, change: StatusChange) -> CapabilityFuture<'_, ()> {
        Box::pin(async move {
            ArticleRepository::update_status(id, &change).await?;
            Ok(())
        })
    }

    fn save_content<'a>(
        &'a self,
        id: ArticleId,
        original_content: &'a str,
        summary: &'a str,
    ) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            ArticleRepository::save_content(id, original_content, summary).await?;
            Ok(())
        })
    }

    fn save_title<'a>(&'a self, id: ArticleId, title: &'a str) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            ArticleRepository::save_title(id, title).await?;
            Ok(())
        })
    }

    fn save_thumbnail<'a>(&'a self, id: ArticleId, url: &'a str) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            ArticleRepository::save_thumbnail(id, url).await?;
            Ok(())
        })
    }

    fn save_audio<'a>(&'a self, id: ArticleId, url: &'a str) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            ArticleRepository::save_audio(id, url).await?;
            Ok(())
        })
    }

    fn save_video<'a>(
        &'a self,
        id: ArticleId,
        url: &'a str,
        duration_seconds: u32,
    ) -> CapabilityFuture<'a, ()> {
        Box::pin(async move {
            ArticleRepository::save_video(id, url, duration_seconds).await?;
            Ok(())
        })
    }
}
