use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Config(String),

    #[error("{message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("Audio error: {0}")]
    Media(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AppError {
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Provider {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::VoiceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Provider { .. }
            | AppError::Media(_)
            | AppError::Io(_)
            | AppError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Provider { .. } => "API_ERROR",
            AppError::Media(_) => "MEDIA_ERROR",
            AppError::VoiceNotFound(_) => "VOICE_NOT_FOUND",
            AppError::Io(_) => "IO_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = match &self {
            AppError::VoiceNotFound(v) => format!("Voice '{}' not found", v),
            other => other.to_string(),
        };

        tracing::error!("Request failed: {} - {}", code, message);

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
