use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::AudioFormat;
use crate::error::AppError;

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(data: &str) -> Result<Vec<u8>, AppError> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::Media(format!("Invalid base64 audio payload: {}", e)))
}

/// Where the bytes of a generated podcast live.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// Decoded audio held in memory.
    Buffer(Vec<u8>),
    /// `data:<mime>;base64,<payload>` URL, decoded on demand.
    DataUrl(String),
}

impl AudioSource {
    pub fn data_url(format: AudioFormat, bytes: &[u8]) -> Self {
        AudioSource::DataUrl(format!("data:{};base64,{}", format.mime_type(), encode(bytes)))
    }

    pub fn bytes(&self) -> Result<Vec<u8>, AppError> {
        match self {
            AudioSource::Buffer(bytes) => Ok(bytes.clone()),
            AudioSource::DataUrl(url) => {
                let (_, data) = url
                    .strip_prefix("data:")
                    .and_then(|rest| rest.split_once(','))
                    .ok_or_else(|| AppError::Media("Malformed data URL".into()))?;
                decode(data)
            }
        }
    }

    /// Decoded size in bytes, without decoding.
    pub fn len_hint(&self) -> usize {
        match self {
            AudioSource::Buffer(bytes) => bytes.len(),
            AudioSource::DataUrl(url) => {
                let data = url.split_once(',').map_or("", |(_, data)| data).trim();
                let padding = data.bytes().rev().take_while(|&b| b == b'=').count();
                (data.len() / 4 * 3).saturating_sub(padding)
            }
        }
    }
}
