pub mod client;
pub mod settings;
pub mod voice;

use serde::{Deserialize, Serialize};

use crate::audio::payload;
use crate::error::AppError;
use crate::validation;

pub use client::ElevenLabsClient;
pub use settings::{GenerationSettings, SettingsOverrides};
pub use voice::{Voice, VoiceCategory, VoiceSettings};

/// Result of a generation attempt. `audio_data` and `error` are never both set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
    pub voice_used: Voice,
    pub settings_used: GenerationSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    pub fn failure(voice_used: Voice, error: impl Into<String>) -> Self {
        Self {
            success: false,
            audio_data: None,
            voice_used,
            settings_used: GenerationSettings::default(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub success: bool,
    pub voices: Vec<Voice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Speech generation and voice lookup, folded into uniform envelopes.
pub struct SpeechService {
    client: ElevenLabsClient,
}

impl SpeechService {
    pub fn new(client: ElevenLabsClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ElevenLabsClient {
        &self.client
    }

    pub async fn list_voices(&self) -> VoicesResponse {
        match self.client.list_voices().await {
            Ok(voices) => VoicesResponse {
                success: true,
                voices,
                error: None,
            },
            Err(e) => {
                tracing::error!("Error fetching voices: {}", e);
                VoicesResponse {
                    success: false,
                    voices: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Generate speech, resolving the voice metadata with a directory lookup.
    pub async fn generate_speech(
        &self,
        text: &str,
        voice_id: &str,
        overrides: &SettingsOverrides,
    ) -> GenerateResponse {
        self.generate(text, voice_id, overrides, None).await
    }

    /// Generate speech for a voice the caller already resolved.
    pub async fn generate_speech_with_voice(
        &self,
        text: &str,
        voice: Voice,
        overrides: &SettingsOverrides,
    ) -> GenerateResponse {
        let voice_id = voice.voice_id.clone();
        self.generate(text, &voice_id, overrides, Some(voice)).await
    }

    async fn generate(
        &self,
        text: &str,
        voice_id: &str,
        overrides: &SettingsOverrides,
        known_voice: Option<Voice>,
    ) -> GenerateResponse {
        let settings = GenerationSettings::default().merged(overrides);

        match self.synthesize(text, voice_id, &settings).await {
            Ok(audio_data) => {
                let voice_used = match known_voice {
                    Some(voice) => voice,
                    None => self.resolve_voice(voice_id).await,
                };
                GenerateResponse {
                    success: true,
                    audio_data: Some(audio_data),
                    voice_used,
                    settings_used: settings,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!("Error generating speech: {}", e);
                GenerateResponse::failure(Voice::unknown(voice_id), e.to_string())
            }
        }
    }

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        settings: &GenerationSettings,
    ) -> Result<String, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("Text content is required".into()));
        }
        validation::validate_voice_id(voice_id)?;
        settings.validate()?;

        let audio = self
            .client
            .synthesize(text.trim(), voice_id, settings)
            .await?;
        if audio.is_empty() {
            return Err(AppError::provider(None, "Provider returned no audio"));
        }
        Ok(payload::encode(&audio))
    }

    async fn resolve_voice(&self, voice_id: &str) -> Voice {
        match self.client.list_voices().await {
            Ok(voices) => voices
                .into_iter()
                .find(|v| v.voice_id == voice_id)
                .unwrap_or_else(|| Voice::unknown(voice_id)),
            Err(e) => {
                tracing::warn!("Could not resolve voice {}: {}", voice_id, e);
                Voice::unknown(voice_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service_with_audio(server: &MockServer, audio: Vec<u8>) -> SpeechService {
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(audio))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/voices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "voices": [{ "voice_id": "abc123", "name": "Rachel", "category": "premade" }]
            })))
            .mount(server)
            .await;

        let client = ElevenLabsClient::new(ProviderConfig::new("k", server.uri())).unwrap();
        SpeechService::new(client)
    }

    #[tokio::test]
    async fn test_generate_success_envelope() {
        let server = MockServer::start().await;
        let service = service_with_audio(&server, b"ID3fake-mpeg".to_vec()).await;

        let response = service
            .generate_speech(
                "Hello world, this is a test.",
                "abc123",
                &SettingsOverrides::default(),
            )
            .await;

        assert!(response.success);
        assert!(response.error.is_none());
        let audio = payload::decode(response.audio_data.as_deref().unwrap()).unwrap();
        assert_eq!(audio, b"ID3fake-mpeg");
        assert_eq!(response.voice_used.name, "Rachel");
        assert_eq!(response.settings_used, GenerationSettings::default());
    }

    #[tokio::test]
    async fn test_known_voice_skips_directory() {
        let server = MockServer::start().await;
        let service = service_with_audio(&server, vec![1, 2, 3]).await;
        let mut voice = Voice::unknown("abc123");
        voice.name = "Preselected".into();

        let response = service
            .generate_speech_with_voice(
                "Hello world, this is a test.",
                voice,
                &SettingsOverrides::default(),
            )
            .await;

        assert!(response.success);
        assert_eq!(response.voice_used.name, "Preselected");
        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.url.path() != "/v1/voices"));
    }

    #[tokio::test]
    async fn test_provider_failure_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/abc123"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": { "message": "Invalid API key" }
            })))
            .mount(&server)
            .await;
        let client = ElevenLabsClient::new(ProviderConfig::new("bad", server.uri())).unwrap();
        let service = SpeechService::new(client);

        let overrides = SettingsOverrides {
            stability: Some(0.9),
            ..Default::default()
        };
        let response = service
            .generate_speech("Hello world, this is a test.", "abc123", &overrides)
            .await;

        assert!(!response.success);
        assert!(response.audio_data.is_none());
        assert_eq!(response.error.as_deref(), Some("Invalid API key"));
        assert_eq!(response.voice_used.name, "Unknown Voice");
        assert_eq!(response.settings_used, GenerationSettings::default());
    }

    #[tokio::test]
    async fn test_missing_voice_fails_fast() {
        let server = MockServer::start().await;
        let client = ElevenLabsClient::new(ProviderConfig::new("k", server.uri())).unwrap();
        let service = SpeechService::new(client);

        let response = service
            .generate_speech("Hello world, this is a test.", "", &SettingsOverrides::default())
            .await;

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Voice ID is required"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_voices_failure_is_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/voices"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let client = ElevenLabsClient::new(ProviderConfig::new("k", server.uri())).unwrap();

        let response = SpeechService::new(client).list_voices().await;
        assert!(!response.success);
        assert!(response.voices.is_empty());
        assert_eq!(
            response.error.as_deref(),
            Some("API request failed: 500 Internal Server Error")
        );
    }
}
