//! Thin wrapper around the ElevenLabs REST API.

use reqwest::{header, Response, StatusCode};
use serde::Serialize;

use super::settings::GenerationSettings;
use super::voice::{ProviderVoice, ProviderVoiceList, Voice};
use crate::config::ProviderConfig;
use crate::error::AppError;

pub struct ElevenLabsClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: SynthesisVoiceSettings,
}

#[derive(Debug, Serialize)]
struct SynthesisVoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl ElevenLabsClient {
    pub fn new(config: ProviderConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn list_voices(&self) -> Result<Vec<Voice>, AppError> {
        let response = self.get(&["v1", "voices"]).await?;
        let list: ProviderVoiceList = response.json().await?;
        Ok(list.voices.into_iter().map(Voice::from).collect())
    }

    pub async fn voice_details(&self, voice_id: &str) -> Result<Voice, AppError> {
        match self.get(&["v1", "voices", voice_id]).await {
            Ok(response) => {
                let raw: ProviderVoice = response.json().await?;
                Ok(Voice::from(raw))
            }
            Err(AppError::Provider {
                status: Some(404), ..
            }) => Err(AppError::VoiceNotFound(voice_id.to_string())),
            Err(e) => Err(e),
        }
    }

    pub async fn user_info(&self) -> Result<serde_json::Value, AppError> {
        let response = self.get(&["v1", "user"]).await?;
        Ok(response.json().await?)
    }

    /// True when the configured key is accepted by the provider.
    pub async fn validate_api_key(&self) -> bool {
        match self.user_info().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("API key check failed: {}", e);
                false
            }
        }
    }

    /// Synthesize `text` with `voice_id` and return the raw MPEG bytes.
    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &GenerationSettings,
    ) -> Result<Vec<u8>, AppError> {
        let api_key = self.config.require_api_key()?;
        let body = SynthesisRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: SynthesisVoiceSettings {
                stability: settings.stability,
                similarity_boost: settings.similarity_boost,
                style: settings.style,
                use_speaker_boost: settings.use_speaker_boost,
            },
        };

        let url = self.config.endpoint(&["v1", "text-to-speech", voice_id])?;
        let response = self
            .http
            .post(url)
            .header("xi-api-key", api_key)
            .header(header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    async fn get(&self, segments: &[&str]) -> Result<Response, AppError> {
        let api_key = self.config.require_api_key()?;
        let url = self.config.endpoint(segments)?;
        let response = self
            .http
            .get(url)
            .header("xi-api-key", api_key)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::provider(None, format!("Request to ElevenLabs failed: {}", e))
}

async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::provider(
        Some(status.as_u16()),
        error_message(status, &body),
    ))
}

/// Pick the most specific message out of a provider error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = format!(
        "API request failed: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string();

    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback;
    };

    json.pointer("/detail/message")
        .or_else(|| json.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or(fallback)
}
