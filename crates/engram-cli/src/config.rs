//! Configuration management for Engram CLI
//!
//! Stores API key, server URL and default project in ~/.config/engram/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR: &str = "engram";
const CONFIG_FILE: &str = "config.toml";

/// CLI Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Project recorded as the source of saves and ingests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_project: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    pub fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key);
    }

    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = url.trim().trim_end_matches('/').to_string();
    }

    /// Set or clear (empty name) the default project
    pub fn set_default_project(&mut self, name: &str) {
        let name = name.trim();
        self.default_project = (!name.is_empty()).then(|| name.to_string());
    }

    /// Explicit project wins over the configured default
    pub fn project(&self, explicit: Option<String>) -> Option<String> {
        explicit.or_else(|| self.default_project.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.set_api_key("k-123".to_string());
        config.set_base_url("https://engram.example.com/ ");
        config.set_default_project("engram");

        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
        assert_eq!(config.base_url, "https://engram.example.com");
    }

    #[test]
    fn test_project_precedence() {
        let mut config = Config::default();
        assert_eq!(config.project(None), None);

        config.set_default_project("web");
        assert_eq!(config.project(None).as_deref(), Some("web"));
        assert_eq!(config.project(Some("cli".to_string())).as_deref(), Some("cli"));

        config.set_default_project("  ");
        assert_eq!(config.default_project, None);
    }
}
