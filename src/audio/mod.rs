pub mod payload;
pub mod podcast;
pub mod probe;

use serde::{Deserialize, Serialize};

pub use payload::AudioSource;
pub use podcast::PodcastAudio;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Ogg,
}

impl AudioFormat {
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_lowercase();
        if mime.contains("wav") {
            Self::Wav
        } else if mime.contains("ogg") {
            Self::Ogg
        } else {
            Self::Mp3
        }
    }

    pub fn from_filename(name: &str) -> Self {
        match name.rsplit('.').next().map(str::to_lowercase).as_deref() {
            Some("wav") => Self::Wav,
            Some("ogg") => Self::Ogg,
            _ => Self::Mp3,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub format: AudioFormat,
    /// Seconds; zero when unknown.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u16>,
}

impl AudioMetadata {
    pub fn unknown(format: AudioFormat) -> Self {
        Self {
            format,
            duration: 0.0,
            sample_rate: None,
            channels: None,
        }
    }
}

/// `m:ss`
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
