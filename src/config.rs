use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the upstream ElevenLabs API. Built once at startup and
/// shared read-only with the client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_id: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: base_url.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("ELEVENLABS_API_KEY not found in environment variables");
        }

        let base_url =
            std::env::var("ELEVENLABS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model_id =
            std::env::var("ELEVENLABS_MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string());
        let timeout_secs = match std::env::var("ELEVENLABS_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                AppError::Config(format!("ELEVENLABS_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            base_url,
            model_id,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// The API key, or a configuration error if none was provided.
    pub fn require_api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("ElevenLabs API key not configured".into()))
    }

    /// URL for `segments` under the base URL. Each segment is
    /// percent-encoded on its own and can't add or remove path levels.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let invalid = |reason: String| {
            AppError::Config(format!(
                "Invalid ElevenLabs base URL '{}': {}",
                self.base_url, reason
            ))
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub provider: ProviderConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid address {}:{}", host, port)))?;
        let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "./static".to_string());

        Ok(Self {
            addr,
            static_dir: static_dir.into(),
            provider: ProviderConfig::from_env()?,
        })
    }
}
