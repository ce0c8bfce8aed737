use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceCategory {
    Premade,
    Cloned,
    Professional,
    Generated,
    #[default]
    General,
}

impl VoiceCategory {
    /// Map a provider category string, falling back to `General`.
    pub fn from_provider(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("premade") => Self::Premade,
            Some("cloned") => Self::Cloned,
            Some("professional") => Self::Professional,
            Some("generated") => Self::Generated,
            _ => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premade => "premade",
            Self::Cloned => "cloned",
            Self::Professional => "professional",
            Self::Generated => "generated",
            Self::General => "general",
        }
    }
}

/// Default tuning a voice ships with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: VoiceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<VoiceSettings>,
}

impl Voice {
    /// Placeholder used when the provider cannot tell us about `voice_id`.
    pub fn unknown(voice_id: impl Into<String>) -> Self {
        Self::bare(voice_id, "Unknown Voice")
    }

    /// Voice with no display name, used in rejected-request envelopes.
    pub fn empty(voice_id: impl Into<String>) -> Self {
        Self::bare(voice_id, "")
    }

    fn bare(voice_id: impl Into<String>, name: &str) -> Self {
        Self {
            voice_id: voice_id.into(),
            name: name.to_string(),
            category: VoiceCategory::General,
            description: None,
            preview_url: None,
            labels: BTreeMap::new(),
            settings: None,
        }
    }

    /// Short human-readable description for listings.
    pub fn summary(&self) -> String {
        if let Some(desc) = self.description.as_deref().filter(|d| !d.is_empty()) {
            return desc.to_string();
        }

        let traits: Vec<String> = self
            .labels
            .iter()
            .filter(|(key, value)| !value.is_empty() && key.as_str() != "voice_id")
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();

        if traits.is_empty() {
            "Professional voice".to_string()
        } else {
            traits.join(", ")
        }
    }
}

// Provider wire format. Every field may be missing or null.

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderVoiceList {
    #[serde(default)]
    pub voices: Vec<ProviderVoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderVoice {
    pub voice_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub settings: Option<ProviderVoiceSettings>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderVoiceSettings {
    #[serde(default)]
    pub stability: Option<f32>,
    #[serde(default)]
    pub similarity_boost: Option<f32>,
    #[serde(default)]
    pub style: Option<f32>,
    #[serde(default)]
    pub use_speaker_boost: Option<bool>,
}

impl From<ProviderVoice> for Voice {
    fn from(raw: ProviderVoice) -> Self {
        Self {
            name: raw.name.unwrap_or_default(),
            category: VoiceCategory::from_provider(raw.category.as_deref()),
            description: raw.description,
            preview_url: raw.preview_url,
            labels: raw.labels.unwrap_or_default(),
            settings: raw.settings.map(|s| VoiceSettings {
                stability: s.stability.unwrap_or(0.5),
                similarity_boost: s.similarity_boost.unwrap_or(0.5),
                style: s.style.unwrap_or(0.0),
                use_speaker_boost: s.use_speaker_boost.unwrap_or(false),
            }),
            voice_id: raw.voice_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_sparse_record() {
        let raw: ProviderVoice = serde_json::from_value(serde_json::json!({
            "voice_id": "v1",
            "name": "Rachel",
            "settings": { "stability": 0.8 }
        }))
        .unwrap();
        let voice = Voice::from(raw);

        assert_eq!(voice.category, VoiceCategory::General);
        assert!(voice.labels.is_empty());
        let settings = voice.settings.unwrap();
        assert_eq!(settings.stability, 0.8);
        assert_eq!(settings.similarity_boost, 0.5);
        assert_eq!(settings.style, 0.0);
        assert!(!settings.use_speaker_boost);
    }

    #[test]
    fn test_explicit_zero_settings_kept() {
        let raw: ProviderVoice = serde_json::from_value(serde_json::json!({
            "voice_id": "v3",
            "name": "Domi",
            "settings": { "stability": 0.0, "similarity_boost": 0.0 }
        }))
        .unwrap();
        let settings = Voice::from(raw).settings.unwrap();
        assert_eq!(settings.stability, 0.0);
        assert_eq!(settings.similarity_boost, 0.0);
    }

    #[test]
    fn test_null_fields_accepted() {
        let raw: ProviderVoice = serde_json::from_value(serde_json::json!({
            "voice_id": "v2",
            "name": "Adam",
            "category": null,
            "labels": null,
            "settings": null
        }))
        .unwrap();
        let voice = Voice::from(raw);
        assert_eq!(voice.category, VoiceCategory::General);
        assert!(voice.settings.is_none());
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(VoiceCategory::from_provider(Some("cloned")), VoiceCategory::Cloned);
        assert_eq!(VoiceCategory::from_provider(Some("Premade")), VoiceCategory::Premade);
        assert_eq!(VoiceCategory::from_provider(Some("famous")), VoiceCategory::General);
        assert_eq!(VoiceCategory::from_provider(None), VoiceCategory::General);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_value(Voice::unknown("x")).unwrap();
        assert_eq!(json["category"], "general");
        assert_eq!(json["name"], "Unknown Voice");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_summary_prefers_description() {
        let mut voice = Voice::unknown("x");
        assert_eq!(voice.summary(), "Professional voice");

        voice.labels.insert("accent".into(), "british".into());
        voice.labels.insert("gender".into(), "female".into());
        assert_eq!(voice.summary(), "accent: british, gender: female");

        voice.description = Some("Warm narrator".into());
        assert_eq!(voice.summary(), "Warm narrator");
    }
}
