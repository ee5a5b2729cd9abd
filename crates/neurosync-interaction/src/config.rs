//! Configuration file management for NeuroSync.
//!
//! Reads `secret.json` and `config.toml` from `~/.config/neurosync/`. The API
//! key may also come from the `GEMINI_API_KEY` or `API_KEY` environment
//! variables, which take precedence over the file.

use std::fs;
use std::path::{Path, PathBuf};

use neurosync_core::config::{Credential, SecretConfig, Settings};
use neurosync_core::error::{Result, StudyError};

pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

const SECRET_FILE: &str = "secret.json";
const SETTINGS_FILE: &str = "config.toml";

/// Everything needed to boot the application.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub credential: Option<Credential>,
    pub settings: Settings,
}

/// Returns the configuration directory: ~/.config/neurosync
pub fn default_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StudyError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("neurosync"))
}

/// Loads `secret.json`, or `None` when the file does not exist.
pub fn load_secret_config(path: &Path) -> Result<Option<SecretConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        StudyError::config(format!(
            "Failed to read secret file at {}: {}",
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map(Some).map_err(|e| {
        StudyError::config(format!(
            "Failed to parse secret file at {}: {}",
            path.display(),
            e
        ))
    })
}

/// Loads `config.toml`, falling back to defaults when it does not exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        StudyError::config(format!(
            "Failed to parse settings at {}: {}",
            path.display(),
            e
        ))
    })
}

/// Picks the credential: environment first, then `secret.json`.
pub fn resolve_credential<F>(env: F, secret: Option<&SecretConfig>) -> Option<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_ENV_VARS
        .into_iter()
        .find_map(|name| env(name).and_then(Credential::new))
        .or_else(|| {
            secret
                .and_then(|s| s.gemini.as_ref())
                .and_then(|g| Credential::new(g.api_key.clone()))
        })
}

/// Loads settings and credential from `dir` using the process environment.
///
/// A missing credential is not an error here; the flow controller turns it
/// into the fatal configuration state.
pub fn load_config(dir: &Path) -> Result<LoadedConfig> {
    load_config_with_env(dir, |name| std::env::var(name).ok())
}

pub fn load_config_with_env<F>(dir: &Path, env: F) -> Result<LoadedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = load_secret_config(&dir.join(SECRET_FILE))?;
    let mut settings = load_settings(&dir.join(SETTINGS_FILE))?;

    if let Some(model) = secret
        .as_ref()
        .and_then(|s| s.gemini.as_ref())
        .and_then(|g| g.model_name.clone())
    {
        settings.model = model;
    }

    let credential = resolve_credential(env, secret.as_ref());
    tracing::debug!(
        dir = %dir.display(),
        model = %settings.model,
        has_credential = credential.is_some(),
        "configuration loaded"
    );

    Ok(LoadedConfig {
        credential,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_files_give_defaults_and_no_credential() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = load_config_with_env(temp_dir.path(), no_env).unwrap();
        assert!(loaded.credential.is_none());
        assert_eq!(loaded.settings, Settings::default());
    }

    #[test]
    fn test_secret_file_supplies_key_and_model() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(SECRET_FILE),
            r#"{"gemini": {"api_key": "file-key", "model_name": "gemini-2.5-pro"}}"#,
        )
        .unwrap();

        let loaded = load_config_with_env(temp_dir.path(), no_env).unwrap();
        assert_eq!(loaded.credential.unwrap().expose(), "file-key");
        assert_eq!(loaded.settings.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(SECRET_FILE),
            r#"{"gemini": {"api_key": "file-key"}}"#,
        )
        .unwrap();

        let loaded = load_config_with_env(temp_dir.path(), |name| {
            (name == "API_KEY").then(|| "env-key".to_string())
        })
        .unwrap();
        assert_eq!(loaded.credential.unwrap().expose(), "env-key");
    }

    #[test]
    fn test_blank_env_key_falls_through() {
        let credential = resolve_credential(|_| Some("  ".to_string()), None);
        assert!(credential.is_none());
    }

    #[test]
    fn test_settings_file_parsed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(SETTINGS_FILE),
            "request_timeout_secs = 30\nmax_text_chars = 1000\n",
        )
        .unwrap();

        let loaded = load_config_with_env(temp_dir.path(), no_env).unwrap();
        assert_eq!(loaded.settings.request_timeout_secs, 30);
        assert_eq!(loaded.settings.max_text_chars, 1000);
    }

    #[test]
    fn test_malformed_secret_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(SECRET_FILE), "{not json").unwrap();
        assert!(load_config_with_env(temp_dir.path(), no_env).unwrap_err().is_config());
    }
}
