//! Configuration file handling.
//!
//! TOML file under the platform config dir, every field optional on disk
//! with working defaults, CLI flags override file values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository listing page to sweep.
    pub url: String,
    /// Saved session profile name. Defaults to the target host.
    pub profile: Option<String>,
    /// Minimum wait after each successful star, in milliseconds.
    pub delay_ms: u64,
    /// Run the browser without a window. Keep false for the login run.
    pub headless: bool,
    /// Browser window width and height.
    pub window_width: u32,
    pub window_height: u32,
    /// Navigation timeout in milliseconds.
    pub nav_timeout_ms: u64,
    /// Wait for dynamic content after clicks and page turns, milliseconds.
    pub settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "https://github.com/karpathy?tab=repositories".to_string(),
            profile: None,
            delay_ms: 1_000,
            headless: false,
            window_width: 1508,
            window_height: 859,
            nav_timeout_ms: 60_000,
            settle_ms: 800,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `None`. A missing file yields defaults; a malformed one is fatal.
    pub fn load(path: Option<PathBuf>) -> Result<Self, Error> {
        let config_path = path.unwrap_or_else(Self::default_path);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", config_path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", config_path.display())))
    }

    /// Save configuration to `path` or the default location.
    pub fn save(&self, path: Option<PathBuf>) -> Result<(), Error> {
        let config_path = path.unwrap_or_else(Self::default_path);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("creating {}: {e}", parent.display())))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("serializing config: {e}")))?;
        std::fs::write(&config_path, content)
            .map_err(|e| Error::Config(format!("writing {}: {e}", config_path.display())))
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stargazer")
            .join("config.toml")
    }

    /// Profile name to use: explicit setting, else the target host.
    pub fn profile_name(&self) -> String {
        if let Some(ref name) = self.profile {
            return name.clone();
        }
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.delay_ms, 1_000);
        assert!(!config.headless);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            url: "https://github.com/torvalds?tab=repositories".to_string(),
            delay_ms: 250,
            ..Config::default()
        };
        config.save(Some(path.clone())).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded.url, config.url);
        assert_eq!(loaded.delay_ms, 250);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "delay_ms = 50\n").unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.delay_ms, 50);
        assert_eq!(config.window_width, 1508);
    }

    #[test]
    fn malformed_file_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "delay_ms = \"not a number\"\n").unwrap();
        assert!(Config::load(Some(path)).is_err());
    }

    #[test]
    fn profile_name_defaults_to_host() {
        let config = Config::default();
        assert_eq!(config.profile_name(), "github.com");

        let named = Config {
            profile: Some("work".to_string()),
            ..Config::default()
        };
        assert_eq!(named.profile_name(), "work");
    }
}
