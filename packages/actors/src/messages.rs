//! Message types for actor communication.

use ractor::{ActorId, RpcReplyPort};
use scribe_core::ArticleId;

/// Messages for the Dispatcher.
#[derive(Debug)]
pub enum DispatcherMessage {
    /// Accept an article for processing.
    Submit {
        article_id: ArticleId,
        reply: RpcReplyPort<Result<(), ActorError>>,
    },

    /// A worker returned from an article and is free again.
    WorkFinished {
        worker: ActorId,
        article_id: ArticleId,
    },

    /// Get pool stats.
    GetStats { reply: RpcReplyPort<PoolStats> },

    /// Stop accepting work and shut the workers down.
    Shutdown,
}

/// Messages for the WorkerActor.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Run the pipeline for one article.
    Process { article_id: ArticleId },

    /// Shutdown the worker once the current article is done.
    Shutdown,
}

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub busy: usize,
    pub pending: usize,
    pub submitted: u64,
    pub finished: u64,
}

/// Error type for actor operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("Queue is full")]
    QueueFull,

    #[error("Pool is shutting down")]
    ShuttingDown,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Actor error: {0}")]
    Actor(String),

    #[error("Timeout")]
    Timeout,
}
