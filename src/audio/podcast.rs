use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use super::{AudioMetadata, AudioSource};
use crate::tts::{GenerationSettings, Voice};

/// A generated podcast held in memory for the rest of the session.
#[derive(Debug, Clone)]
pub struct PodcastAudio {
    pub id: String,
    pub source: AudioSource,
    pub metadata: AudioMetadata,
    pub created_at: DateTime<Utc>,
    pub settings: GenerationSettings,
    pub voice: Voice,
    pub original_text: String,
}

impl PodcastAudio {
    /// File name used when saving this podcast.
    pub fn filename(&self, now: DateTime<Utc>) -> String {
        generate_filename(&self.original_text, &self.voice.name, now)
    }
}

lazy_static! {
    static ref RESERVED_CHARS: Regex = Regex::new(r#"[<>:"/\\|?*]"#).unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

pub fn sanitize_filename(name: &str) -> String {
    let replaced = RESERVED_CHARS.replace_all(name, "_");
    WHITESPACE.replace_all(&replaced, "_").to_lowercase()
}

/// `podcast_<voice>_<first 30 chars>_<YYYYMMDDTHHMMSS>.mp3`
pub fn generate_filename(text: &str, voice_name: &str, now: DateTime<Utc>) -> String {
    let short_text: String = text.chars().take(30).collect();
    format!(
        "podcast_{}_{}_{}.mp3",
        sanitize_filename(voice_name),
        sanitize_filename(short_text.trim()),
        now.format("%Y%m%dT%H%M%S")
    )
}
