//! Remote capability clients for the article pipeline.
//!
//! - Gemini: extraction, summarization, titles and thumbnails
//! - ElevenLabs: speech synthesis
//! - Fal: queued video generation
//! - APNS: push notifications

pub mod apns;
pub mod config;
pub mod elevenlabs;
mod error;
pub mod fal;
pub mod gemini;

pub use apns::ApnsNotifier;
pub use config::{ApnsConfig, ElevenLabsConfig, FalConfig, GeminiConfig, ServicesConfig};
pub use elevenlabs::ElevenLabsClient;
pub use error::{Result, ServiceError};
pub use fal::{FalQueueClient, FalVideoSynthesizer, PollPolicy, QueueStatus, VideoQueue};
pub use gemini::GeminiClient;
