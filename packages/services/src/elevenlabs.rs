//! ElevenLabs text-to-speech.

use reqwest::Client;
use scribe_core::{AudioSynthesizer, CapabilityFuture, StageError};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ElevenLabsConfig, MULTILINGUAL_TTS_MODEL};
use crate::error::{Result, ServiceError, check_status};

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

pub struct ElevenLabsClient {
    client: Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Model used for `language`; anything other than English needs the multilingual model.
    pub fn model_for(&self, language: Option<&str>) -> &str {
        match language.map(|l| l.trim().to_ascii_lowercase()) {
            Some(l) if !l.is_empty() && l != "en" && !l.starts_with("en-") => {
                MULTILINGUAL_TTS_MODEL
            }
            _ => &self.config.model_id,
        }
    }

    /// Convert `text` to MP3 bytes.
    pub async fn text_to_speech(&self, text: &str, language: Option<&str>) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidResponse("no text to synthesize".into()));
        }

        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id
        );
        let model_id = self.model_for(language);

        let request = TtsRequest {
            text,
            model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        debug!(model_id, chars = text.len(), "Requesting speech synthesis");

        let response = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let response = check_status("elevenlabs", response).await?;
        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(ServiceError::InvalidResponse("empty audio payload".into()));
        }
        Ok(audio.to_vec())
    }
}

impl AudioSynthesizer for ElevenLabsClient {
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
        language: Option<&'a str>,
        style: Option<&'a str>,
    ) -> CapabilityFuture<'a, Vec<u8>> {
        Box::pin(async move {
            // Style only shapes the summary text; the voice is fixed.
            let audio = self
                .text_to_speech(text, language)
                .await
                .map_err(|e| StageError::Synthesis(e.to_string()))?;
            info!(bytes = audio.len(), style = style.unwrap_or("summarize"), "Synthesized audio");
            Ok(audio)
        })
    }
}
