//! Local settings for the task CLI
//!
//! Settings are stored as JSON in `~/.task-cli/config.json`:
//!
//! ```json
//! { "clickup": { "token": "pk_...", "defaultWorkspace": "...", "defaultSpace": "...", "defaultList": "..." } }
//! ```
//!
//! The file is read once per invocation and written only by explicit
//! `config` updates. There is no locking; two invocations updating it at the
//! same time may lose one of the updates.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::atomic::write_atomic;

const CONFIG_DIR: &str = ".task-cli";
const CONFIG_FILE: &str = "config.json";
const BACKUPS_DIR: &str = "backups";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No usable configuration at {path} ({reason}). Run `task config --token <token>` first")]
    Missing { path: PathBuf, reason: String },

    #[error("Failed to write configuration {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not determine the home directory")]
    NoHomeDir,
}

/// Remote credentials and default locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workspace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_space: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_list: Option<String>,
}

impl Config {
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Token with all but the last four characters hidden
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }

    /// Shallow merge: every field present in `update` replaces the current value
    pub fn merge(&mut self, update: ConfigUpdate) {
        if let Some(token) = update.token {
            self.token = token;
        }
        if let Some(workspace) = update.default_workspace {
            self.default_workspace = Some(workspace);
        }
        if let Some(space) = update.default_space {
            self.default_space = Some(space);
        }
        if let Some(list) = update.default_list {
            self.default_list = Some(list);
        }
    }
}

/// A partial [`Config`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub token: Option<String>,
    pub default_workspace: Option<String>,
    pub default_space: Option<String>,
    pub default_list: Option<String>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ConfigUpdate::default()
    }
}

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    clickup: Config,
}

/// Reads and writes the settings file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.task-cli/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
        Ok(dirs.home_dir().join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding pre-apply snapshots, next to the settings file
    pub fn backups_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(|dir| dir.join(BACKUPS_DIR))
            .unwrap_or_else(|| PathBuf::from(BACKUPS_DIR))
    }

    /// Loads the settings; an absent or unparseable file is [`ConfigError::Missing`]
    pub fn read(&self) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(|e| ConfigError::Missing {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let file: SettingsFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::Missing {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %self.path.display(), "Loaded configuration");
        Ok(file.clickup)
    }

    /// Merges `update` onto the stored settings (or a default) and writes the result
    pub fn update(&self, update: ConfigUpdate) -> Result<Config, ConfigError> {
        let mut config = match self.read() {
            Ok(config) => config,
            Err(e) => {
                if self.path.exists() {
                    warn!("Replacing unreadable configuration: {e}");
                }
                Config::default()
            }
        };

        config.merge(update);
        self.write(&config)?;
        Ok(config)
    }

    fn write(&self, config: &Config) -> Result<(), ConfigError> {
        let file = SettingsFile {
            clickup: config.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        write_atomic(&self.path, content.as_bytes()).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join(".task-cli").join("config.json"))
    }

    #[test]
    fn missing_file_is_config_missing() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(store(&dir).read(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn unparseable_file_is_config_missing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.read(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn update_creates_file_from_default() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let config = store
            .update(ConfigUpdate {
                default_list: Some("901".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.token, "");
        assert_eq!(config.default_list.as_deref(), Some("901"));
        assert_eq!(store.read().unwrap(), config);
    }

    #[test]
    fn update_is_a_shallow_merge() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store
            .update(ConfigUpdate {
                token: Some("pk_1".to_string()),
                default_space: Some("s1".to_string()),
                ..Default::default()
            })
            .unwrap();
        let config = store
            .update(ConfigUpdate {
                default_space: Some("s2".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.token, "pk_1");
        assert_eq!(config.default_space.as_deref(), Some("s2"));
    }

    #[test]
    fn file_uses_camel_case_under_clickup() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .update(ConfigUpdate {
                token: Some("pk_1".to_string()),
                default_workspace: Some("w".to_string()),
                ..Default::default()
            })
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["clickup"]["token"], "pk_1");
        assert_eq!(raw["clickup"]["defaultWorkspace"], "w");
    }

    #[test]
    fn reads_file_without_optional_fields() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"clickup":{"token":"pk_x"}}"#).unwrap();

        let config = store.read().unwrap();
        assert!(config.has_token());
        assert_eq!(config.default_list, None);
    }

    #[test]
    fn backups_live_next_to_config() {
        let store = ConfigStore::new("/home/u/.task-cli/config.json");
        assert_eq!(store.backups_dir(), PathBuf::from("/home/u/.task-cli/backups"));
    }

    #[test]
    fn masks_token() {
        let config = Config {
            token: "pk_12345678".to_string(),
            ..Default::default()
        };
        assert_eq!(config.masked_token(), "*******5678");
    }
}
