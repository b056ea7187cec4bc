//! `task config`

use anyhow::Result;
use serde_json::json;

use super::context::GlobalOptions;
use super::output::Output;
use crate::storage::{Config, ConfigError, ConfigUpdate};

pub fn run(options: &GlobalOptions, update: ConfigUpdate, output: &Output) -> Result<()> {
    let store = options.store()?;

    let config = if update.is_empty() {
        match store.read() {
            Ok(config) => config,
            Err(ConfigError::Missing { .. }) => Config::default(),
            Err(e) => return Err(e.into()),
        }
    } else {
        let config = store.update(update)?;
        output.success(&format!("Configuration saved to {}", store.path().display()));
        config
    };

    if output.is_json() {
        output.data(&json!({
            "path": store.path(),
            "token": config.masked_token(),
            "defaultWorkspace": config.default_workspace,
            "defaultSpace": config.default_space,
            "defaultList": config.default_list,
        }));
        return Ok(());
    }

    let unset = || "(not set)".to_string();
    println!("Config file:       {}", store.path().display());
    println!(
        "Token:             {}",
        if config.has_token() {
            config.masked_token()
        } else {
            unset()
        }
    );
    println!(
        "Default workspace: {}",
        config.default_workspace.clone().unwrap_or_else(unset)
    );
    println!(
        "Default space:     {}",
        config.default_space.clone().unwrap_or_else(unset)
    );
    println!(
        "Default list:      {}",
        config.default_list.clone().unwrap_or_else(unset)
    );

    Ok(())
}
