use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ingest::DEFAULT_MAX_TEXT_CHARS;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// API credential for the generative service.
///
/// `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for empty or whitespace-only keys.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Root structure of `secret.json`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiSecret>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeminiSecret {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Non-secret settings from `config.toml`. Every field has a default.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub max_text_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_blank() {
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new(" key ").unwrap().expose(), "key");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("super-secret").unwrap();
        assert!(!format!("{credential:?}").contains("super-secret"));
    }

    #[test]
    fn test_settings_partial_toml() {
        let settings: Settings = toml::from_str("model = \"gemini-2.5-pro\"").unwrap();
        assert_eq!(settings.model, "gemini-2.5-pro");
        assert_eq!(settings.max_text_chars, DEFAULT_MAX_TEXT_CHARS);
    }
}
