use std::sync::Arc;

use scribe_core::{
    ArtifactStore, AudioSynthesizer, Notifier, Summarizer, ThumbnailGenerator, TitleGenerator,
    VideoSynthesizer,
};

/// The collaborators a pipeline runs against.
#[derive(Clone)]
pub struct Capabilities {
    pub summarizer: Arc<dyn Summarizer>,
    pub title_generator: Arc<dyn TitleGenerator>,
    pub thumbnail_generator: Arc<dyn ThumbnailGenerator>,
    pub audio: Arc<dyn AudioSynthesizer>,
    pub video: Arc<dyn VideoSynthesizer>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub notifier: Arc<dyn Notifier>,
}
