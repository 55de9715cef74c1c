use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

// ── Environment variables ────────────────────────────────────────

pub const OPENAI_KEY_VAR: &str = "MOCKTOPUS_OPENAI_KEY";
pub const GEMINI_KEY_VAR: &str = "MOCKTOPUS_GEMINI_KEY";
pub const OPENAI_MODEL_VAR: &str = "MOCKTOPUS_OPENAI_MODEL";
pub const GEMINI_MODEL_VAR: &str = "MOCKTOPUS_GEMINI_MODEL";
pub const OPENAI_BASE_URL_VAR: &str = "MOCKTOPUS_OPENAI_BASE_URL";
pub const GEMINI_BASE_URL_VAR: &str = "MOCKTOPUS_GEMINI_BASE_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ── LLM provider types ──────────────────────────────────────────

/// Which model provider answers prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Gemini,
}

impl LlmProvider {
    pub fn display_name(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OpenAI",
            LlmProvider::Gemini => "Gemini",
        }
    }
}

/// Full configuration for the chosen provider, handed to the generation client.
#[derive(Debug, Clone)]
pub struct LlmProviderConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    /// Base URL override. None = provider default.
    pub base_url: Option<String>,
    /// Model override. None = provider default.
    pub model: Option<String>,
    pub timeout: Duration,
}

/// Redacted view of the provider config (no raw API key).
#[derive(Debug, Clone, Serialize)]
pub struct LlmConfigInfo {
    pub provider: LlmProvider,
    pub has_api_key: bool,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl LlmConfigInfo {
    pub fn from_config(config: &LlmProviderConfig) -> Self {
        Self {
            provider: config.provider,
            has_api_key: !config.api_key.is_empty(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout.as_secs(),
        }
    }
}

// ── Settings file ────────────────────────────────────────────────

/// Per-provider overrides from `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Optional user settings. API keys are never read from here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai: ProviderOverrides,
    pub gemini: ProviderOverrides,
    pub timeout_secs: Option<u64>,
}

/// Load settings from `path`. A missing file yields defaults.
pub fn load_settings(path: &Path) -> Result<Settings, AppError> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&text).map_err(|e| {
        AppError::validation(format!("Invalid settings file {}: {e}", path.display()))
    })?;
    if settings.timeout_secs == Some(0) {
        return Err(AppError::validation(format!(
            "Invalid settings file {}: timeout_secs must be greater than zero",
            path.display()
        )));
    }
    Ok(settings)
}

// ── Credential resolution ────────────────────────────────────────

/// Pick the provider from the process environment.
pub fn resolve_from_env(settings: &Settings) -> Result<LlmProviderConfig, AppError> {
    resolve_provider(settings, |name| std::env::var(name).ok())
}

/// Pick the provider whose credential is present; OpenAI wins if both are.
/// `lookup` reads one variable; empty values count as unset.
pub fn resolve_provider<F>(settings: &Settings, lookup: F) -> Result<LlmProviderConfig, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let (provider, api_key, overrides, model_var, base_url_var) =
        if let Some(key) = get(OPENAI_KEY_VAR) {
            (LlmProvider::OpenAi, key, &settings.openai, OPENAI_MODEL_VAR, OPENAI_BASE_URL_VAR)
        } else if let Some(key) = get(GEMINI_KEY_VAR) {
            (LlmProvider::Gemini, key, &settings.gemini, GEMINI_MODEL_VAR, GEMINI_BASE_URL_VAR)
        } else {
            return Err(AppError::MissingCredentials);
        };

    Ok(LlmProviderConfig {
        provider,
        api_key: api_key.trim().to_string(),
        base_url: get(base_url_var).or_else(|| overrides.base_url.clone()),
        model: get(model_var).or_else(|| overrides.model.clone()),
        timeout: Duration::from_secs(settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn no_credentials_is_rejected() {
        let err = resolve_provider(&Settings::default(), env(&[])).unwrap_err();
        assert!(matches!(err, AppError::MissingCredentials));
    }

    #[test]
    fn empty_credentials_count_as_missing() {
        let err = resolve_provider(
            &Settings::default(),
            env(&[(OPENAI_KEY_VAR, ""), (GEMINI_KEY_VAR, "  ")]),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::MissingCredentials));
    }

    #[test]
    fn openai_takes_priority() {
        let config = resolve_provider(
            &Settings::default(),
            env(&[(OPENAI_KEY_VAR, "sk-1"), (GEMINI_KEY_VAR, "g-1")]),
        )
        .unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAi);
        assert_eq!(config.api_key, "sk-1");
    }

    #[test]
    fn gemini_used_when_only_key() {
        let config = resolve_provider(&Settings::default(), env(&[(GEMINI_KEY_VAR, "g-1")])).unwrap();
        assert_eq!(config.provider, LlmProvider::Gemini);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn env_overrides_beat_settings_file() {
        let settings = Settings {
            gemini: ProviderOverrides {
                model: Some("file-model".into()),
                base_url: Some("http://file".into()),
            },
            timeout_secs: Some(5),
            ..Settings::default()
        };
        let config = resolve_provider(
            &settings,
            env(&[(GEMINI_KEY_VAR, "g-1"), (GEMINI_MODEL_VAR, "env-model")]),
        )
        .unwrap();
        assert_eq!(config.model.as_deref(), Some("env-model"));
        assert_eq!(config.base_url.as_deref(), Some("http://file"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn config_info_redacts_key() {
        let config = resolve_provider(&Settings::default(), env(&[(OPENAI_KEY_VAR, "sk-secret")])).unwrap();
        let json = serde_json::to_string(&LlmConfigInfo::from_config(&config)).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(json.contains("\"provider\":\"openai\""));
        assert!(json.contains("\"has_api_key\":true"));
    }

    #[test]
    fn settings_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = crate::paths::settings_path(dir.path());
        std::fs::write(
            &path,
            r#"{ "openai": { "model": "gpt-4o" }, "timeout_secs": 30 }"#,
        )
        .unwrap();
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.openai.model.as_deref(), Some("gpt-4o"));
        assert_eq!(settings.gemini, ProviderOverrides::default());
        assert_eq!(settings.timeout_secs, Some(30));
    }

    #[test]
    fn missing_settings_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_settings_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_settings(&path).unwrap_err(), AppError::Validation { .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "timeout_secs": 0 }"#).unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(err.to_string().contains("timeout_secs"));
    }
}
