//! `task apply`

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use super::context::CommandContext;
use super::output::Output;
use crate::apply::{ApplyEngine, ApplyError, ApplyItem, ApplyOptions, ApplyReport, Outcome};
use crate::domain::{BulkConfig, ItemKind};

pub async fn run(ctx: &CommandContext, file: &Path, dry_run: bool, output: &Output) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document = BulkConfig::from_yaml(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    if document.is_empty() {
        output.warning(&format!("{} contains no tags, statuses or tasks", file.display()));
    }

    let options = ApplyOptions {
        dry_run,
        throttle: ctx.throttle(),
    };
    let engine = ApplyEngine::new(ctx.api(), ctx.target(), options).with_backup(ctx.backups());

    let report = match engine.apply(&document).await {
        Ok(report) => report,
        Err(ApplyError::ValidationFailed(errors)) => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "success": false,
                    "validation_errors": errors,
                }));
            } else {
                eprintln!("{}", "Configuration validation failed:".red());
                for error in &errors {
                    eprintln!("  - {}", error);
                }
            }
            bail!("Invalid configuration: {} error(s)", errors.len());
        }
        Err(e) => return Err(e).context("Apply aborted before any change was made"),
    };

    // Per-item failures are reported, not turned into a failing exit code
    if output.is_json() {
        output.data(&report);
    } else {
        render(&report);
    }
    Ok(())
}

fn render(report: &ApplyReport) {
    if let Some(backup) = &report.backup {
        println!("Backup written to {}", backup.display());
    }
    if report.dry_run {
        println!("{}", "Dry run: no changes will be made".blue());
    }

    for (kind, title) in [
        (ItemKind::Tag, "Tags"),
        (ItemKind::Status, "Statuses"),
        (ItemKind::Task, "Tasks"),
    ] {
        let mut items = report.of_kind(kind).peekable();
        if items.peek().is_none() {
            continue;
        }
        println!();
        println!("{}", title.bold());
        for item in items {
            println!("{}", item_line(item));
        }
    }

    println!();
    let summary = report.summary();
    if report.has_failures() {
        println!("{}", summary.yellow());
    } else {
        println!("{}", summary.green());
    }
}

fn item_line(item: &ApplyItem) -> String {
    let indent = "  ".repeat(item.depth + 1);
    let action = item.action.map(|a| a.as_str()).unwrap_or("skip");

    match &item.outcome {
        Outcome::Planned => format!("{}Would {} {}", indent, action, item.name).blue().to_string(),
        Outcome::Applied { id: Some(id) } => {
            format!("{}✓ {}d {} [{}]", indent, action, item.name, id).green().to_string()
        }
        Outcome::Applied { id: None } => {
            format!("{}✓ {}d {}", indent, action, item.name).green().to_string()
        }
        Outcome::Failed { error } => {
            format!("{}✗ Failed to {} {}: {}", indent, action, item.name, error)
                .red()
                .to_string()
        }
        Outcome::Skipped => format!("{}- Skipped {} (parent failed)", indent, item.name)
            .dimmed()
            .to_string(),
    }
}
