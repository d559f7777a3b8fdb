use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::api::Channel;

/// Backend default port from the GTM API service
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable that overrides the configured base URL
pub const API_URL_ENV: &str = "GTM_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub default_channel: Option<Channel>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> io::Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Pick the base URL: explicit flag, then `GTM_API_URL` (a `.env` file
    /// is honoured), then the saved config, then the local default.
    pub fn resolve_api_url(&self, flag: Option<&str>) -> String {
        dotenvy::dotenv().ok();
        let env = std::env::var(API_URL_ENV).ok();
        self.pick_api_url(flag, env.as_deref())
    }

    fn pick_api_url(&self, flag: Option<&str>, env: Option<&str>) -> String {
        flag.or(env)
            .or(self.api_url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }

    /// Directory holding config.json and the TUI log file
    pub fn config_dir() -> io::Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine config directory")
        })?;

        Ok(config_dir.join("gtm-suite"))
    }

    fn get_config_path() -> io::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_url: Some("https://gtm.example.com".to_string()),
            default_channel: Some(Channel::Linkedin),
        };
        config.save_to(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"linkedin\""));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_api_url_precedence() {
        let config = Config {
            api_url: Some("http://saved:9000".to_string()),
            default_channel: None,
        };

        assert_eq!(
            config.pick_api_url(Some("http://flag:1"), Some("http://env:2")),
            "http://flag:1"
        );
        assert_eq!(config.pick_api_url(None, Some("http://env:2")), "http://env:2");
        assert_eq!(config.pick_api_url(None, None), "http://saved:9000");
        assert_eq!(Config::new().pick_api_url(None, None), DEFAULT_API_URL);
        assert_eq!(Config::new().pick_api_url(Some("  "), None), DEFAULT_API_URL);
    }
}
