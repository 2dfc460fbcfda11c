use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

/// External services that need a stored API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    OpenWeather,
    Ambee,
    Gemini,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::OpenWeather => "openweather",
            ServiceId::Ambee => "ambee",
            ServiceId::Gemini => "gemini",
        }
    }

    pub const fn all() -> &'static [ServiceId] {
        &[ServiceId::OpenWeather, ServiceId::Ambee, ServiceId::Gemini]
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServiceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ServiceId::OpenWeather),
            "ambee" => Ok(ServiceId::Ambee),
            "gemini" => Ok(ServiceId::Gemini),
            _ => Err(anyhow!(
                "Unknown service '{value}'. Supported services: openweather, ambee, gemini."
            )),
        }
    }
}

/// Configuration for a single external service (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [services.openweather]
    /// api_key = "..."
    pub services: HashMap<String, ServiceConfig>,
}

impl Config {
    pub fn has_service(&self, id: ServiceId) -> bool {
        self.services.contains_key(id.as_str())
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
        let dirs = ProjectDirs::from("dev", "env-advisor", "advisor")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a service API key.
    pub fn upsert_service_api_key(&mut self, id: ServiceId, api_key: String) {
        self.services.insert(id.as_str().to_string(), ServiceConfig { api_key });
    }

    /// Returns API key for a service, if present.
    pub fn service_api_key(&self, id: ServiceId) -> Option<&str> {
        self.services.get(id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    /// API key for a service, or an error with a configuration hint.
    pub fn require_api_key(&self, id: ServiceId) -> Result<&str> {
        self.service_api_key(id).ok_or_else(|| {
            anyhow!(
                "No API key configured for service '{id}'.\n\
                 Hint: run `advisor configure {id}` and enter your API key."
            )
        })
    }

    pub fn is_service_configured(&self, id: ServiceId) -> bool {
        self.service_api_key(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_id_as_str_roundtrip() {
        for id in ServiceId::all() {
            let s = id.as_str();
            let parsed = ServiceId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_service_error() {
        let err = ServiceId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown service"));
    }

    #[test]
    fn set_api_key_for_service() {
        let mut cfg = Config::default();

        cfg.upsert_service_api_key(ServiceId::OpenWeather, "OPEN_KEY".into());

        let key = cfg.service_api_key(ServiceId::OpenWeather);
        assert_eq!(key, Some("OPEN_KEY"));
        assert!(cfg.is_service_configured(ServiceId::OpenWeather));
        assert!(!cfg.is_service_configured(ServiceId::Gemini));
    }

    #[test]
    fn require_api_key_errors_with_hint_when_missing() {
        let cfg = Config::default();
        let err = cfg.require_api_key(ServiceId::Ambee).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured for service 'ambee'"));
        assert!(msg.contains("Hint: run `advisor configure"));
    }
}
