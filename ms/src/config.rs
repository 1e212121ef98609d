//! Configuration for memorystore

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the block store directory
    #[serde(rename = "store-dir", default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// How long a writer waits on a locked database before giving up
    #[serde(rename = "busy-timeout-ms", default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Default store directory, shared with the planning assistant
pub fn default_store_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("partyhat")
        .join("memory")
}

fn default_busy_timeout_ms() -> u64 {
    crate::DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        let default_paths = [
            Some(PathBuf::from("memorystore.yml")),
            dirs::config_dir().map(|p| p.join("memorystore").join("config.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("store-dir: /tmp/blocks\n").unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/blocks"));
        assert_eq!(config.busy_timeout_ms, crate::DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("ms.yml");
        std::fs::write(&path, "busy-timeout-ms: 250\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.busy_timeout_ms, 250);
    }
}
