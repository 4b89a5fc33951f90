//! The unit of work a worker runs for each article.

use std::future::Future;
use std::pin::Pin;

use pipeline::ArticlePipeline;
use scribe_core::ArticleId;

/// Future returned by an [`ArticleProcessor`].
pub type ProcessFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Trait for whatever takes an article from `queued` to a terminal status.
///
/// The future carries no result: the outcome lives on the persisted article.
pub trait ArticleProcessor: Send + Sync + 'static {
    fn process(&self, article_id: ArticleId) -> ProcessFuture;
}

impl ArticleProcessor for ArticlePipeline {
    fn process(&self, article_id: ArticleId) -> ProcessFuture {
        let pipeline = self.clone();
        Box::pin(async move { pipeline.process(article_id).await })
    }
}

/// A simple function-based processor.
pub struct FnProcessor<F>
where
    F: Fn(ArticleId) -> ProcessFuture + Send + Sync + 'static,
{
    process: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(ArticleId) -> ProcessFuture + Send + Sync + 'static,
{
    pub fn new(process: F) -> Self {
        Self { process }
    }
}

impl<F> ArticleProcessor for FnProcessor<F>
where
    F: Fn(ArticleId) -> ProcessFuture + Send + Sync + 'static,
{
    fn process(&self, article_id: ArticleId) -> ProcessFuture {
        (self.process)(article_id)
    }
}
