use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Language;
use crate::provider::openweather::DEFAULT_BASE_URL;

pub const DEFAULT_CITY: &str = "Taipei";

/// Top-level configuration stored on disk.
///
/// Doubles as the persisted preference store: `last_city` and `language` are
/// read once at startup and written back on every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Provider base URL; overridable for tests and proxies.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// City shown when the user has never searched anything.
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Last successfully searched city, persisted across sessions.
    pub last_city: Option<String>,

    /// Preferred UI language tag, persisted across sessions.
    pub language: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_city: default_city(),
            last_city: None,
            language: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

impl Config {
    /// API key, or a hint about how to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `skycast configure` and enter your OpenWeather API key."
            )
        })
    }

    /// City to look up when none was given: the last searched one, falling
    /// back to the configured default.
    pub fn startup_city(&self) -> &str {
        self.last_city.as_deref().unwrap_or(&self.default_city)
    }

    /// Preferred language as a strongly-typed value; unset or unparseable
    /// values fall back to the default language.
    pub fn preferred_language(&self) -> Language {
        self.language
            .as_deref()
            .and_then(|tag| Language::try_from(tag).ok())
            .unwrap_or_default()
    }

    pub fn remember_city(&mut self, city: &str) {
        self.last_city = Some(city.to_string());
    }

    pub fn set_language(&mut self, lang: Language) {
        self.language = Some(lang.as_tag().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_errors_with_hint() {
        let cfg = Config::default();
        let err = cfg.require_api_key().unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("Hint: run `skycast configure`"));
    }

    #[test]
    fn startup_city_prefers_last_searched() {
        let mut cfg = Config::default();
        assert_eq!(cfg.startup_city(), DEFAULT_CITY);

        cfg.remember_city("London");
        assert_eq!(cfg.startup_city(), "London");
    }

    #[test]
    fn preferred_language_falls_back_on_bad_tag() {
        let mut cfg = Config::default();
        assert_eq!(cfg.preferred_language(), Language::ChineseTraditional);

        cfg.set_language(Language::English);
        assert_eq!(cfg.preferred_language(), Language::English);

        cfg.language = Some("klingon".to_string());
        assert_eq!(cfg.preferred_language(), Language::ChineseTraditional);
    }

    #[test]
    fn preferences_survive_a_toml_roundtrip() {
        let mut cfg = Config::default();
        cfg.api_key = Some("KEY".to_string());
        cfg.remember_city("Tokyo");
        cfg.set_language(Language::English);

        let serialized = toml::to_string_pretty(&cfg).unwrap();
        let restored: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(restored.api_key.as_deref(), Some("KEY"));
        assert_eq!(restored.startup_city(), "Tokyo");
        assert_eq!(restored.preferred_language(), Language::English);
    }

    #[test]
    fn empty_file_parses_with_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.default_city, DEFAULT_CITY);
        assert!(cfg.api_key.is_none());
    }
}
