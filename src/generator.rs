//! Client-side flow: validate, call the server, decode, build a podcast.

use chrono::Utc;
use reqwest::header;
use serde::Serialize;

use crate::audio::{payload, probe, AudioFormat, AudioMetadata, AudioSource, PodcastAudio};
use crate::error::AppError;
use crate::tts::{GenerateResponse, GenerationSettings, SettingsOverrides, Voice, VoicesResponse};
use crate::validation;

#[derive(Debug, Serialize)]
struct GenerateRequestBody<'a> {
    text: &'a str,
    voice_id: &'a str,
    settings: SettingsOverrides,
}

/// Talks to a running podcast server.
pub struct PodcastGenerator {
    http: reqwest::Client,
    server_url: String,
}

impl PodcastGenerator {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn voices(&self) -> Result<Vec<Voice>, AppError> {
        let response: VoicesResponse = self
            .http
            .get(format!("{}/api/voices", self.server_url))
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(AppError::provider(
                None,
                response
                    .error
                    .unwrap_or_else(|| "Failed to fetch voices".into()),
            ));
        }
        Ok(response.voices)
    }

    /// Generate a podcast for `text` spoken by `voice`.
    pub async fn generate(
        &self,
        text: &str,
        voice: &Voice,
        settings: GenerationSettings,
    ) -> Result<PodcastAudio, AppError> {
        validation::validate_text(text)?;
        validation::validate_voice_id(&voice.voice_id)?;
        let text = text.trim();

        tracing::info!(
            "Requesting podcast from {} ({} characters, voice {})",
            self.server_url,
            text.chars().count(),
            voice.voice_id
        );

        let response: GenerateResponse = self
            .http
            .post(format!("{}/api/generate-podcast", self.server_url))
            .json(&GenerateRequestBody {
                text,
                voice_id: &voice.voice_id,
                settings: settings.into(),
            })
            .send()
            .await?
            .json()
            .await?;

        build_podcast(response, text)
    }

    /// Download the provider's sample clip for `voice`.
    pub async fn preview(&self, voice: &Voice) -> Result<PodcastAudio, AppError> {
        let url = voice
            .preview_url
            .as_deref()
            .ok_or_else(|| AppError::Media(format!("Voice '{}' has no preview", voice.name)))?;

        tracing::info!("Fetching preview for voice {} from {}", voice.voice_id, url);
        let response = self.http.get(url).send().await?.error_for_status()?;

        let mime = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|mime| mime.starts_with("audio/"))
            .map(str::to_string);
        let format = match mime {
            Some(mime) => AudioFormat::from_mime(&mime),
            None => AudioFormat::from_filename(response.url().path()),
        };
        let bytes = response.bytes().await?.to_vec();

        Ok(PodcastAudio {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: read_metadata(&bytes, format),
            source: AudioSource::Buffer(bytes),
            created_at: Utc::now(),
            settings: GenerationSettings::default(),
            voice: voice.clone(),
            original_text: String::new(),
        })
    }
}

/// Probe `bytes`, settling for unknown metadata when they can't be read.
fn read_metadata(bytes: &[u8], format: AudioFormat) -> AudioMetadata {
    probe::probe(bytes, format).unwrap_or_else(|e| {
        tracing::warn!("Error getting audio metadata: {}", e);
        AudioMetadata::unknown(format)
    })
}

/// Turn a server envelope into a playable podcast.
pub fn build_podcast(response: GenerateResponse, text: &str) -> Result<PodcastAudio, AppError> {
    if !response.success {
        return Err(AppError::provider(
            None,
            response
                .error
                .unwrap_or_else(|| "Failed to generate podcast".into()),
        ));
    }

    let encoded = response
        .audio_data
        .ok_or_else(|| AppError::Media("No audio data received".into()))?;
    let bytes = payload::decode(&encoded)?;
    let format = AudioFormat::from_mime("audio/mpeg");

    let metadata = read_metadata(&bytes, format);

    let created_at = Utc::now();
    Ok(PodcastAudio {
        id: uuid::Uuid::new_v4().to_string(),
        source: AudioSource::Buffer(bytes),
        metadata,
        created_at,
        settings: response.settings_used,
        voice: response.voice_used,
        original_text: text.trim().to_string(),
    })
}
