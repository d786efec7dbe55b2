//! Coach configuration.
//!
//! Loads coach settings from `~/.growthplan/config.json`. Environment
//! variables override the file; the API key has no built-in default.

use crate::config::config_file_path;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Default generative model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `coach` section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Settings file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrowthConfig {
    pub coach: Option<CoachSettings>,
}

/// Load the settings file. A missing file yields defaults.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be read or parsed.
pub fn load_config() -> Result<GrowthConfig> {
    let path = config_file_path().ok_or(Error::Config("Could not determine home directory".into()))?;

    if !path.exists() {
        return Ok(GrowthConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
}

/// Fully resolved coach settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCoach {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

/// Resolve coach settings: env var > config file > default.
///
/// # Errors
///
/// Returns `Error::Config` when no API key is configured anywhere.
pub fn resolve(file: Option<&CoachSettings>) -> Result<ResolvedCoach> {
    let from_file = file.cloned().unwrap_or_default();

    let api_key = env_value("GROWTH_COACH_API_KEY")
        .or(from_file.api_key)
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| Error::Config("no coach API key configured".into()))?;

    let model = env_value("GROWTH_COACH_MODEL")
        .or(from_file.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let endpoint = env_value("GROWTH_COACH_ENDPOINT")
        .or(from_file.endpoint)
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let timeout = Duration::from_secs(from_file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

    Ok(ResolvedCoach {
        api_key,
        model,
        endpoint: endpoint.trim_end_matches('/').to_string(),
        timeout,
    })
}

fn env_value(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_parse_partial_file() {
        let config: GrowthConfig =
            serde_json::from_str(r#"{"coach": {"model": "gemini-pro"}}"#).unwrap();
        let coach = config.coach.unwrap();
        assert_eq!(coach.model.as_deref(), Some("gemini-pro"));
        assert!(coach.api_key.is_none());

        let empty: GrowthConfig = serde_json::from_str("{}").unwrap();
        assert!(empty.coach.is_none());
    }

    #[test]
    fn test_resolve_uses_file_values_and_defaults() {
        // Env overrides are exercised by the CLI tests; only assert when unset.
        if std::env::var("GROWTH_COACH_API_KEY").is_ok()
            || std::env::var("GROWTH_COACH_MODEL").is_ok()
            || std::env::var("GROWTH_COACH_ENDPOINT").is_ok()
        {
            return;
        }

        let settings = CoachSettings {
            api_key: Some("k".into()),
            endpoint: Some("http://localhost:9999/".into()),
            ..CoachSettings::default()
        };
        let resolved = resolve(Some(&settings)).unwrap();
        assert_eq!(resolved.api_key, "k");
        assert_eq!(resolved.model, DEFAULT_MODEL);
        assert_eq!(resolved.endpoint, "http://localhost:9999");
        assert_eq!(resolved.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let err = resolve(None).unwrap_err();
        assert!(err.hint().is_some());
    }
}
