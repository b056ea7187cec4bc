//! Per-invocation command context
//!
//! Built once from the global flags and the settings file, then handed to
//! the command. Nothing in it changes while the command runs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::apply::{ApplyTarget, BackupWriter};
use crate::remote::{ClickUpApi, ClientConfig, RemoteClient};
use crate::storage::{Config, ConfigStore};

/// Global flags that shape the context
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
    pub api_url: String,
    pub throttle: Duration,
}

impl GlobalOptions {
    /// The settings store at the overridden or default location
    pub fn store(&self) -> Result<ConfigStore> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => ConfigStore::default_path()?,
        };
        Ok(ConfigStore::new(path))
    }
}

pub struct CommandContext {
    store: ConfigStore,
    config: Config,
    api: ClickUpApi,
    throttle: Duration,
}

impl CommandContext {
    /// Loads settings and builds the authenticated API client
    pub fn load(options: &GlobalOptions) -> Result<Self> {
        let store = options.store()?;
        let config = store.read()?;

        if !config.has_token() {
            bail!(
                "No API token configured in {}. Run `task config --token <token>` first",
                store.path().display()
            );
        }

        let client_config = ClientConfig::default().with_base_url(options.api_url.clone());
        let client = RemoteClient::new(config.token.clone(), client_config)
            .context("Failed to set up the API client")?;
        debug!(base_url = %client.base_url(), "API client ready");

        Ok(Self {
            store,
            config,
            api: ClickUpApi::new(client),
            throttle: options.throttle,
        })
    }

    pub fn api(&self) -> &ClickUpApi {
        &self.api
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Explicit id, else the configured default
    pub fn workspace_id(&self, explicit: Option<String>) -> Result<String> {
        resolve(explicit, &self.config.default_workspace, "workspace", "--workspace")
    }

    pub fn space_id(&self, explicit: Option<String>) -> Result<String> {
        resolve(explicit, &self.config.default_space, "space", "--space")
    }

    pub fn list_id(&self, explicit: Option<String>) -> Result<String> {
        resolve(explicit, &self.config.default_list, "list", "--list")
    }

    /// Default space and list, for apply and export
    pub fn target(&self) -> ApplyTarget {
        ApplyTarget {
            space_id: self.config.default_space.clone(),
            list_id: self.config.default_list.clone(),
        }
    }

    pub fn backups(&self) -> BackupWriter {
        BackupWriter::new(self.store.backups_dir())
    }
}

fn resolve(
    explicit: Option<String>,
    default: &Option<String>,
    what: &str,
    flag: &str,
) -> Result<String> {
    match explicit.or_else(|| default.clone()) {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => bail!(
            "No {what} specified. Pass {flag} or set a default with `task config {flag} <id>`"
        ),
    }
}
