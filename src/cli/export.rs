//! `task export` (Markdown) and `task export-config` (YAML)

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::context::CommandContext;
use super::output::Output;
use crate::apply::{export_config, ExportSelection};
use crate::domain::{TaskForest, Visit};
use crate::remote::TaskApi;

/// Sections accepted by `export-config --type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportType {
    Tags,
    Status,
    Tasks,
    #[default]
    All,
}

impl From<ExportType> for ExportSelection {
    fn from(kind: ExportType) -> Self {
        match kind {
            ExportType::Tags => ExportSelection::tags(),
            ExportType::Status => ExportSelection::statuses(),
            ExportType::Tasks => ExportSelection::tasks(),
            ExportType::All => ExportSelection::all(),
        }
    }
}

pub async fn markdown(ctx: &CommandContext, file: &Path, output: &Output) -> Result<()> {
    let list_id = ctx.list_id(None)?;
    let tasks = ctx
        .api()
        .list_tasks(&list_id)
        .await
        .with_context(|| format!("Failed to fetch tasks of list {list_id}"))?;

    let forest = TaskForest::build(tasks);
    for issue in forest.issues() {
        output.warning(&issue.to_string());
    }

    let visits = forest.walk();
    fs::write(file, render_markdown(&forest, &visits))
        .with_context(|| format!("Failed to write {}", file.display()))?;

    output.success(&format!(
        "Exported {} task(s) to {}",
        visits.len(),
        file.display()
    ));
    Ok(())
}

/// Headings nest with the task tree; each top-level task is separated by a rule
pub fn render_markdown(forest: &TaskForest, visits: &[Visit]) -> String {
    let mut markdown = String::from("# Tasks\n\n");

    for (i, visit) in visits.iter().enumerate() {
        let task = forest.task(visit.node);
        if visit.depth == 0 && i > 0 {
            markdown.push_str("---\n\n");
        }

        let level = (visit.depth + 2).min(6);
        markdown.push_str(&format!("{} {}\n\n", "#".repeat(level), task.name));
        if let Some(summary) = task.summary_line() {
            markdown.push_str(summary);
            markdown.push_str("\n\n");
        }
        markdown.push_str(&format!("- Status: {}\n", task.status.name));
        markdown.push_str(&format!("- Priority: {}\n", task.priority_label()));
        markdown.push_str(&format!("- ID: {}\n", task.id));
        if let Some(url) = &task.url {
            markdown.push_str(&format!("- URL: {}\n", url));
        }
        markdown.push('\n');
    }

    markdown
}

pub async fn config(
    ctx: &CommandContext,
    kind: ExportType,
    file: Option<&Path>,
    output: &Output,
) -> Result<()> {
    let document = export_config(ctx.api(), &ctx.target(), kind.into())
        .await
        .context("Failed to export configuration")?;
    let yaml = document.to_yaml().context("Failed to serialize configuration")?;

    match file {
        Some(file) => {
            fs::write(file, &yaml).with_context(|| format!("Failed to write {}", file.display()))?;
            output.success(&format!("Configuration exported to {}", file.display()));
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
