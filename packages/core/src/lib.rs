//! Core domain types for the article processing pipeline.
//!
//! This crate contains shared types used across all packages:
//! - Article and ArticleStatus for the persisted record and its lifecycle
//! - StageError, the failure taxonomy of pipeline stages
//! - Capability traits the pipeline depends on
//! - Notifications and processing events

pub mod artifact;
pub mod capability;
mod article;
mod error;
mod events;

pub use article::{
    Article, ArticleId, ArticleStatus, Format, Length, StatusChange, TransitionError,
};
pub use capability::{
    ArticleStore, ArtifactStore, AudioSynthesizer, CapabilityFuture, Notifier, Summarizer,
    Summary, ThumbnailGenerator, TitleGenerator, VideoSynthesizer,
};
pub use error::{StageError, StageResult};
pub use events::{Notification, ProcessingEvent};
