//! # Storage Layer
//!
//! Local persistence for the task CLI. Everything else lives remotely.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Settings | JSON | `~/.task-cli/config.json` |
//! | Pre-apply backups | YAML | `~/.task-cli/backups/config-<timestamp>.yml` |
//!
//! All writes are atomic (temp file + rename). Nothing is locked.

mod atomic;
mod config;

pub use atomic::write_atomic;
pub use config::{Config, ConfigError, ConfigStore, ConfigUpdate};
