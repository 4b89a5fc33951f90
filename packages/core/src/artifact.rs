//! Storage keys and content types for pipeline artifacts.

use crate::ArticleId;

pub const PNG: &str = "image/png";
pub const MPEG_AUDIO: &str = "audio/mpeg";
pub const MP4_VIDEO: &str = "video/mp4";

pub fn thumbnail_key(id: ArticleId) -> String {
    format!("thumbnails/article_{id}.png")
}

pub fn audio_key(id: ArticleId) -> String {
    format!("audio/article_{id}.mp3")
}

pub fn video_key(id: ArticleId) -> String {
    format!("videos/article_{id}.mp4")
}
