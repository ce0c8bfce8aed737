use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Tuning values sent with every synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
    pub speed: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
            style: 0.0,
            use_speaker_boost: false,
            speed: 1.0,
        }
    }
}

/// Caller-supplied settings where every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl GenerationSettings {
    /// Overlay `overrides` on top of `self`; present fields win.
    pub fn merged(self, overrides: &SettingsOverrides) -> Self {
        Self {
            stability: overrides.stability.unwrap_or(self.stability),
            similarity_boost: overrides.similarity_boost.unwrap_or(self.similarity_boost),
            style: overrides.style.unwrap_or(self.style),
            use_speaker_boost: overrides.use_speaker_boost.unwrap_or(self.use_speaker_boost),
            speed: overrides.speed.unwrap_or(self.speed),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [
            ("stability", self.stability),
            ("similarity_boost", self.similarity_boost),
            ("style", self.style),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Validation(format!(
                    "{} must be between 0 and 1",
                    name
                )));
            }
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(AppError::Validation("speed must be a positive number".into()));
        }
        Ok(())
    }
}

impl From<GenerationSettings> for SettingsOverrides {
    fn from(settings: GenerationSettings) -> Self {
        Self {
            stability: Some(settings.stability),
            similarity_boost: Some(settings.similarity_boost),
            style: Some(settings.style),
            use_speaker_boost: Some(settings.use_speaker_boost),
            speed: Some(settings.speed),
        }
    }
}
