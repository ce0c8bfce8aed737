pub mod handlers;
pub mod routes;

use serde::{Deserialize, Serialize};

use crate::tts::SettingsOverrides;

pub use crate::tts::{GenerateResponse, VoicesResponse};

/// Body of `POST /api/generate-podcast`. Missing fields are reported as
/// validation failures rather than deserialization errors.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub settings: Option<SettingsOverrides>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider_configured: bool,
    pub provider_reachable: bool,
}
