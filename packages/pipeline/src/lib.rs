//! The article processing pipeline.
//!
//! [`ArticlePipeline::process`] takes an article from `queued` to `ready` or
//! `failed`, calling the collaborators in [`Capabilities`] one stage at a time.

mod capabilities;
mod orchestrator;

pub use capabilities::Capabilities;
pub use orchestrator::{
    ArticlePipeline, DEFAULT_LANGUAGE, DEFAULT_STYLE, FALLBACK_TITLE, PipelineConfig,
};
