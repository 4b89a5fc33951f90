//! Environment-driven configuration for the remote services.
//!
//! Each config has a `from_env` constructor and plain constructors for tests
//! and embedding.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, ServiceError};

pub const DEFAULT_GEMINI_TEXT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_TTS_MODEL: &str = "eleven_monolingual_v1";
pub const MULTILINGUAL_TTS_MODEL: &str = "eleven_multilingual_v2";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            text_model: DEFAULT_GEMINI_TEXT_MODEL.to_string(),
            image_model: DEFAULT_GEMINI_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(180),
        }
    }

    /// Reads `GEMINI_API_KEY` (required), `GEMINI_TEXT_MODEL`,
    /// `GEMINI_IMAGE_MODEL` and `GEMINI_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::new(required("GEMINI_API_KEY")?);
        if let Some(model) = optional("GEMINI_TEXT_MODEL") {
            cfg.text_model = model;
        }
        if let Some(model) = optional("GEMINI_IMAGE_MODEL") {
            cfg.image_model = model;
        }
        if let Some(secs) = parse_u64_env("GEMINI_TIMEOUT_SECS")? {
            cfg.timeout = Duration::from_secs(secs);
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    pub timeout: Duration,
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.elevenlabs.io".to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_TTS_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Reads `ELEVENLABS_API_KEY` (required), `ELEVENLABS_VOICE_ID`,
    /// `ELEVENLABS_MODEL_ID` and `ELEVENLABS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::new(required("ELEVENLABS_API_KEY")?);
        if let Some(voice) = optional("ELEVENLABS_VOICE_ID") {
            cfg.voice_id = voice;
        }
        if let Some(model) = optional("ELEVENLABS_MODEL_ID") {
            cfg.model_id = model;
        }
        if let Some(secs) = parse_u64_env("ELEVENLABS_TIMEOUT_SECS")? {
            cfg.timeout = Duration::from_secs(secs);
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone)]
pub struct FalConfig {
    /// Without a key every video request fails with a synthesis error.
    pub api_key: Option<String>,
    pub queue_url: String,
    pub model: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// Where downloaded videos are written before upload.
    pub work_dir: PathBuf,
    pub timeout: Duration,
}

impl Default for FalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            queue_url: "https://queue.fal.run".to_string(),
            model: "fal-ai/sora-2".to_string(),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
            work_dir: std::env::temp_dir().join("pocketscribe").join("videos"),
            timeout: Duration::from_secs(300),
        }
    }
}

impl FalConfig {
    /// Reads `FAL_API_KEY`, `FAL_POLL_INTERVAL_SECS`, `FAL_MAX_POLL_ATTEMPTS`
    /// and `VIDEO_WORK_DIR`.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self {
            api_key: optional("FAL_API_KEY"),
            ..Self::default()
        };
        if let Some(secs) = parse_u64_env("FAL_POLL_INTERVAL_SECS")? {
            cfg.poll_interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_u64_env("FAL_MAX_POLL_ATTEMPTS")? {
            cfg.max_poll_attempts = u32::try_from(attempts).map_err(|_| {
                ServiceError::InvalidConfig(format!("FAL_MAX_POLL_ATTEMPTS={attempts} is too large"))
            })?;
        }
        if let Some(dir) = optional("VIDEO_WORK_DIR") {
            cfg.work_dir = PathBuf::from(dir);
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApnsConfig {
    pub token: Option<String>,
    pub device_token: Option<String>,
    pub bundle_id: String,
    pub production: bool,
}

impl ApnsConfig {
    /// Reads `APNS_TOKEN`, `APNS_DEVICE_TOKEN`, `APNS_BUNDLE_ID` and
    /// `APNS_PRODUCTION`. Nothing is required: an unconfigured notifier is a no-op.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            token: optional("APNS_TOKEN"),
            device_token: optional("APNS_DEVICE_TOKEN"),
            bundle_id: optional("APNS_BUNDLE_ID").unwrap_or_default(),
            production: parse_bool_env("APNS_PRODUCTION")?.unwrap_or(false),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some() && self.device_token.is_some()
    }

    pub fn endpoint(&self) -> &'static str {
        if self.production {
            "https://api.push.apple.com"
        } else {
            "https://api.sandbox.push.apple.com"
        }
    }
}

/// Configuration for every remote service.
#[derive(Debug, Clone)]
pub struct ServicesConfig {
    pub gemini: GeminiConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub fal: FalConfig,
    pub apns: ApnsConfig,
}

impl ServicesConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            gemini: GeminiConfig::from_env()?,
            elevenlabs: ElevenLabsConfig::from_env()?,
            fal: FalConfig::from_env()?,
            apns: ApnsConfig::from_env()?,
        })
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| ServiceError::MissingConfig(format!("{name} is required")))
}

fn parse_u64_env(name: &str) -> Result<Option<u64>> {
    optional(name)
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| ServiceError::InvalidConfig(format!("invalid number for {name}={v}")))
        })
        .transpose()
}

fn parse_bool_env(name: &str) -> Result<Option<bool>> {
    let Some(v) = optional(name) else {
        return Ok(None);
    };

    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(Some(true)),
        "0" | "false" | "no" | "n" => Ok(Some(false)),
        _ => Err(ServiceError::InvalidConfig(format!(
            "invalid boolean for {name}={v} (expected true/false)"
        ))),
    }
}
