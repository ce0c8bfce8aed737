use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{GenerateRequest, GenerateResponse, HealthResponse};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::tts::{GenerationSettings, Voice};
use crate::validation;

/// Voice catalog changes rarely; let shared caches hold it.
pub const VOICES_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

pub async fn generate_podcast(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> (StatusCode, Json<GenerateResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject("", rejection.body_text()),
    };

    let text = request.text.unwrap_or_default();
    let voice_id = request.voice_id.unwrap_or_default();
    let overrides = request.settings.unwrap_or_default();

    // Validate input
    if text.is_empty() {
        return reject("", "Text content is required");
    }
    if let Err(e) = validation::validate_voice_id(&voice_id) {
        return reject("", e.to_string());
    }
    if let Err(e) = validation::validate_text(&text) {
        return reject(&voice_id, e.to_string());
    }
    if let Err(e) = GenerationSettings::default().merged(&overrides).validate() {
        return reject(&voice_id, e.to_string());
    }

    tracing::info!(
        "Generating podcast for voice {} with {} characters",
        voice_id,
        text.chars().count()
    );

    let response = state
        .speech
        .generate_speech(&text, &voice_id, &overrides)
        .await;

    if !response.success {
        tracing::error!(
            "Failed to generate podcast: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(response));
    }

    tracing::info!("Successfully generated podcast audio");
    (StatusCode::OK, Json(response))
}

fn reject(voice_id: &str, error: impl Into<String>) -> (StatusCode, Json<GenerateResponse>) {
    let error = error.into();
    tracing::warn!("Rejected generation request: {}", error);
    (
        StatusCode::BAD_REQUEST,
        Json(GenerateResponse::failure(Voice::empty(voice_id), error)),
    )
}

pub async fn list_voices(State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("Fetching voices from ElevenLabs...");

    let response = state.speech.list_voices().await;

    if !response.success {
        tracing::error!(
            "Failed to fetch voices: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response();
    }

    tracing::info!("Successfully fetched {} voices", response.voices.len());
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, VOICES_CACHE_CONTROL)],
        Json(response),
    )
        .into_response()
}

pub async fn voice_details(
    State(state): State<Arc<AppState>>,
    Path(voice_id): Path<String>,
) -> Result<Json<Voice>, AppError> {
    validation::validate_voice_id(&voice_id)?;
    let voice = state.speech.client().voice_details(&voice_id).await?;
    Ok(Json(voice))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let client = state.speech.client();
    let provider_configured = client.is_configured();
    let provider_reachable = provider_configured && client.validate_api_key().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider_configured,
        provider_reachable,
    })
}
