//! Saved browser session profiles.
//!
//! Each profile is a Chromium user-data directory plus a small JSON
//! metadata file. Profiles hold the login state for one site: the first
//! headful run logs in manually, later runs reuse the directory and are
//! already authenticated. The tool itself never reads or writes anything
//! inside the browser's data — the directory is handed to Chromium opaque.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Error;

/// Profile metadata persisted next to the browser data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInfo {
    /// Profile name, usually the target host (e.g. `github.com`).
    pub name: String,
    /// Chromium user-data directory for this profile.
    pub data_dir: PathBuf,
    /// Created timestamp (unix seconds).
    pub created_at: i64,
    /// Last run that used this profile (unix seconds).
    pub last_used: Option<i64>,
}

/// Manages profile directories under one base dir.
pub struct ProfileManager {
    base_dir: PathBuf,
}

impl ProfileManager {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Default profiles directory under the platform data dir.
    pub fn default_base_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stargazer")
            .join("profiles")
    }

    /// Look up a profile by name.
    pub fn get(&self, name: &str) -> Result<ProfileInfo, Error> {
        let meta_file = self.base_dir.join(name).join("profile.json");
        if !meta_file.exists() {
            return Err(Error::Profile(format!("profile not found: {name}")));
        }
        let content = fs::read_to_string(&meta_file)
            .map_err(|e| Error::Profile(format!("reading {}: {e}", meta_file.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Profile(format!("parsing {}: {e}", meta_file.display())))
    }

    /// List all known profiles, most recently used first.
    pub fn list(&self) -> Result<Vec<ProfileInfo>, Error> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }
        let mut profiles = Vec::new();
        let entries = fs::read_dir(&self.base_dir)
            .map_err(|e| Error::Profile(format!("reading profiles dir: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::Profile(e.to_string()))?;
            let file_name = entry.file_name();
            if entry.path().join("profile.json").exists() {
                if let Some(name) = file_name.to_str() {
                    profiles.push(self.get(name)?);
                }
            }
        }
        profiles.sort_by(|a, b| b.last_used.unwrap_or(0).cmp(&a.last_used.unwrap_or(0)));
        Ok(profiles)
    }

    /// Create a profile. The browser data directory is created empty;
    /// Chromium populates it on first launch.
    pub fn create(&self, name: &str) -> Result<ProfileInfo, Error> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(Error::Profile(format!("invalid profile name: {name:?}")));
        }
        let profile_dir = self.base_dir.join(name);
        if profile_dir.exists() {
            return Err(Error::Profile(format!("profile already exists: {name}")));
        }
        fs::create_dir_all(profile_dir.join("browser"))
            .map_err(|e| Error::Profile(format!("creating profile dir: {e}")))?;

        let profile = ProfileInfo {
            name: name.to_string(),
            data_dir: profile_dir.join("browser"),
            created_at: unix_now(),
            last_used: None,
        };
        self.save(&profile)?;
        Ok(profile)
    }

    /// Get the named profile, creating it on first use.
    pub fn ensure(&self, name: &str) -> Result<ProfileInfo, Error> {
        match self.get(name) {
            Ok(profile) => Ok(profile),
            Err(_) => self.create(name),
        }
    }

    /// Stamp a profile as used by the current run.
    pub fn touch(&self, name: &str) -> Result<(), Error> {
        let mut profile = self.get(name)?;
        profile.last_used = Some(unix_now());
        self.save(&profile)
    }

    fn save(&self, profile: &ProfileInfo) -> Result<(), Error> {
        let meta_file = self.base_dir.join(&profile.name).join("profile.json");
        let content = serde_json::to_string_pretty(profile)
            .map_err(|e| Error::Profile(format!("serializing profile: {e}")))?;
        fs::write(&meta_file, content)
            .map_err(|e| Error::Profile(format!("writing {}: {e}", meta_file.display())))
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_and_get() {
        let dir = tempdir().unwrap();
        let manager = ProfileManager::new(dir.path().to_path_buf());

        let profile = manager.create("github.com").unwrap();
        assert_eq!(profile.name, "github.com");
        assert!(profile.data_dir.ends_with("browser"));
        assert!(profile.data_dir.exists());

        let loaded = manager.get("github.com").unwrap();
        assert_eq!(loaded.name, profile.name);
        assert!(loaded.last_used.is_none());
    }

    #[test]
    fn ensure_is_idempotent() {
        let dir = tempdir().unwrap();
        let manager = ProfileManager::new(dir.path().to_path_buf());

        let first = manager.ensure("github.com").unwrap();
        let second = manager.ensure("github.com").unwrap();
        assert_eq!(first.data_dir, second.data_dir);
        assert_eq!(manager.list().unwrap().len(), 1);
    }

    #[test]
    fn touch_updates_last_used() {
        let dir = tempdir().unwrap();
        let manager = ProfileManager::new(dir.path().to_path_buf());

        manager.create("github.com").unwrap();
        manager.touch("github.com").unwrap();
        let profile = manager.get("github.com").unwrap();
        assert!(profile.last_used.is_some());
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempdir().unwrap();
        let manager = ProfileManager::new(dir.path().to_path_buf());
        assert!(manager.create("../escape").is_err());
        assert!(manager.create("").is_err());
    }
}
