//! Applying and exporting declarative configuration
//!
//! - [`ApplyEngine`] realizes a [`BulkConfig`](crate::domain::BulkConfig) against the remote
//! - [`export_config`] turns remote state back into one
//! - [`BackupWriter`] stores such an export before a real apply

mod backup;
mod engine;
mod export;
mod report;

pub use backup::BackupWriter;
pub use engine::{ApplyEngine, ApplyError, ApplyOptions, ApplyTarget};
pub use export::{export_config, task_configs, ExportSelection};
pub use report::{Action, ApplyItem, ApplyReport, Outcome};
