//! Pre-apply snapshots of remote tags and statuses

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use super::engine::ApplyTarget;
use super::export::{export_config, ExportSelection};
use crate::remote::TaskApi;
use crate::storage::write_atomic;

/// Writes `config-<timestamp>.yml` files into a backups directory
///
/// Best effort: a failed backup is logged and never stops the apply.
#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Snapshots the target and returns the written file, if any
    pub async fn write<A: TaskApi + ?Sized>(&self, api: &A, target: &ApplyTarget) -> Option<PathBuf> {
        match self.try_write(api, target).await {
            Ok(path) => {
                info!(path = %path.display(), "Created backup");
                Some(path)
            }
            Err(e) => {
                warn!("Failed to create backup: {e:#}");
                None
            }
        }
    }

    async fn try_write<A: TaskApi + ?Sized>(
        &self,
        api: &A,
        target: &ApplyTarget,
    ) -> anyhow::Result<PathBuf> {
        let selection = ExportSelection {
            tags: target.space_id.is_some(),
            statuses: target.list_id.is_some(),
            tasks: false,
        };
        let snapshot = export_config(api, target, selection)
            .await
            .context("Failed to read current remote state")?;
        let yaml = snapshot.to_yaml().context("Failed to serialize backup")?;

        let path = self.dir.join(backup_file_name());
        write_atomic(&path, yaml.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// `config-2024-02-15T10-30-00-123Z.yml`
fn backup_file_name() -> String {
    format!("config-{}.yml", Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}
