use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub const MIN_TEXT_CHARS: usize = 10;
pub const MAX_TEXT_CHARS: usize = 5000;

lazy_static! {
    static ref VOICE_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Check that podcast text is present and within the accepted length.
///
/// Length is counted in characters of the untrimmed input; only the
/// emptiness check looks at trimmed content.
pub fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("Text content is required".into()));
    }

    let len = text.chars().count();

    if len > MAX_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "Text content must be less than {} characters",
            MAX_TEXT_CHARS
        )));
    }

    if len < MIN_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "Text content must be at least {} characters",
            MIN_TEXT_CHARS
        )));
    }

    Ok(())
}

/// Voice ids end up as a path segment of the provider URL, so only
/// letters, digits, `_` and `-` are accepted.
pub fn validate_voice_id(voice_id: &str) -> Result<(), AppError> {
    if voice_id.trim().is_empty() {
        return Err(AppError::Validation("Voice ID is required".into()));
    }
    if !VOICE_ID.is_match(voice_id) {
        return Err(AppError::Validation(
            "Voice ID contains invalid characters".into(),
        ));
    }
    Ok(())
}
