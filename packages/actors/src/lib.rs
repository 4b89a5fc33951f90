//! Actor system for running articles through the pipeline.
//!
//! This crate provides the Ractor-based pool that bounds how many articles
//! are processed at once.
//!
//! # Architecture
//!
//! - `Dispatcher` - Owns the FIFO of pending articles and supervises workers
//! - `WorkerActor` - Runs one article at a time through an [`ArticleProcessor`]
//! - [`ProcessingHandle`] - The outside entry point: submit, subscribe, stats
//!
//! # Usage
//!
//! ```ignore
//! use actors::{PoolConfig, start_processing};
//!
//! let (pool, _join) = start_processing(Arc::new(pipeline), PoolConfig::from_env()?).await?;
//! let mut events = pool.subscribe();
//! pool.submit(article_id).await?;
//! ```

mod config;
mod dispatcher;
mod messages;
mod processor;
mod supervisor;
mod worker_actor;

pub use config::{DEFAULT_MAX_PENDING, DEFAULT_WORKERS, PoolConfig};
pub use messages::{ActorError, PoolStats};
pub use processor::{ArticleProcessor, FnProcessor, ProcessFuture};
pub use supervisor::{ProcessingHandle, start_processing};
