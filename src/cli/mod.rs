//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Setup | Token and default IDs | `config --token`, `config --list` |
//! | Navigation | Discover IDs | `workspaces`, `spaces`, `lists` |
//! | Task | Single task operations | `list`, `get`, `add`, `update`, `delete` |
//! | Resources | Tags and statuses | `tag add`, `status list` |
//! | Bulk | Declarative configuration | `export-config`, `apply --dry-run` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logging on stderr, or set `RUST_LOG`:
//! ```bash
//! task --verbose apply --file tasks.yml --dry-run
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod apply;
mod config_cmd;
mod context;
mod export;
mod nav;
mod output;
mod status;
mod tag;
mod task;

pub use app::{run, Cli, Commands, RemoteCommands};
pub use output::{Output, OutputFormat};

use crate::domain::is_hex_color;

/// Value parser for `#RRGGBB` color flags
pub(crate) fn parse_color(value: &str) -> Result<String, String> {
    if is_hex_color(value) {
        Ok(value.to_string())
    } else {
        Err(format!("'{value}' is not a #RRGGBB color"))
    }
}
