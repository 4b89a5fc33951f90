//! Wires the configured collaborators into a pipeline.

use std::sync::Arc;

use anyhow::{Context, Result};
use db::DbConfig;
use db::repositories::ArticleRepository;
use pipeline::{ArticlePipeline, Capabilities};
use services::{
    ApnsNotifier, ElevenLabsClient, FalVideoSynthesizer, GeminiClient, ServicesConfig,
};
use storage::Storage;
use tracing::info;

/// Connect to the database and the artifact store.
pub async fn connect() -> Result<Arc<Storage>> {
    let db_config = DbConfig::from_env();
    info!(endpoint = %db_config.endpoint, "Connecting to database");
    db::init(db_config)
        .await
        .context("Failed to initialize database")?;

    let storage = Storage::from_env()
        .await
        .context("Failed to initialize storage")?;
    info!(backend = storage.kind_str(), "Storage ready");

    Ok(Arc::new(storage))
}

/// Build the pipeline from environment configuration.
pub fn build_pipeline(storage: Arc<Storage>) -> Result<ArticlePipeline> {
    let config = ServicesConfig::from_env().context("Failed to load service configuration")?;

    if !config.apns.is_enabled() {
        info!("APNS not configured, notifications are disabled");
    }
    if config.fal.api_key.is_none() {
        info!("FAL_API_KEY not set, video articles will fail");
    }

    let gemini = Arc::new(GeminiClient::new(config.gemini)?);
    let audio = Arc::new(ElevenLabsClient::new(config.elevenlabs)?);
    let video = Arc::new(FalVideoSynthesizer::from_config(&config.fal)?);
    let notifier = Arc::new(ApnsNotifier::new(config.apns)?);

    let caps = Capabilities {
        summarizer: gemini.clone(),
        title_generator: gemini.clone(),
        thumbnail_generator: gemini,
        audio,
        video,
        artifacts: storage,
        notifier,
    };

    Ok(ArticlePipeline::new(Arc::new(ArticleRepository), caps))
}
