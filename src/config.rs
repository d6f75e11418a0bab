//! Client configuration, persisted as JSON under the user config dir.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::StoreError;

const CONFIG_DIR: &str = "sharenav";
const CONFIG_FILE: &str = "client.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the share server (e.g. `http://localhost:8000`)
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Whether the deployment offers the `/search` endpoint. When false the
    /// search controller walks the tree locally instead.
    #[serde(default = "default_remote_search")]
    pub remote_search: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_remote_search() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: default_timeout(),
            remote_search: default_remote_search(),
        }
    }
}

impl ClientConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the saved config, falling back to defaults when none exists or
    /// it fails to parse.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    fn load_from(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("config at {} is unreadable: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist the config, creating the config directory if needed.
    pub fn save(&self) -> Result<(), StoreError> {
        let path = Self::config_path()
            .ok_or_else(|| StoreError::InvalidConfig("no config directory".to_string()))?;
        self.save_to(&path)
    }

    fn save_to(&self, path: &std::path::Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::InvalidConfig(format!("create config dir: {}", e)))?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::InvalidConfig(format!("encode config: {}", e)))?;
        std::fs::write(path, raw)
            .map_err(|e| StoreError::InvalidConfig(format!("write config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        let config = ClientConfig {
            base_url: "https://share.example.com".to_string(),
            timeout_secs: 10,
            remote_search: false,
        };
        config.save_to(&path).unwrap();

        let loaded = ClientConfig::load_from(Some(path));
        assert_eq!(loaded.base_url, "https://share.example.com");
        assert_eq!(loaded.timeout_secs, 10);
        assert!(!loaded.remote_search);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let loaded = ClientConfig::load_from(Some(PathBuf::from("/nonexistent/client.json")));
        assert_eq!(loaded.base_url, ClientConfig::default().base_url);
    }
}
