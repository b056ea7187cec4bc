//! List status commands

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use super::context::CommandContext;
use super::output::Output;
use super::parse_color;
use crate::remote::{StatusSpec, TaskApi};

#[derive(Subcommand)]
pub enum StatusCommands {
    /// List statuses of a list, in workflow order
    List {
        /// List ID (defaults to the configured list)
        #[arg(long)]
        list: Option<String>,
    },

    /// Create a status
    Add {
        name: String,

        /// Color (#RRGGBB)
        #[arg(long, value_parser = parse_color)]
        color: String,

        /// Position in the workflow
        #[arg(long)]
        order: Option<i64>,

        #[arg(long)]
        list: Option<String>,
    },

    /// Rename or recolor a status
    Update {
        /// Current status name
        name: String,

        /// New name
        #[arg(long)]
        rename: Option<String>,

        #[arg(long, value_parser = parse_color)]
        color: Option<String>,

        #[arg(long)]
        order: Option<i64>,

        #[arg(long)]
        list: Option<String>,
    },

    /// Delete a status
    Delete {
        name: String,

        #[arg(long)]
        list: Option<String>,
    },
}

pub async fn run(cmd: StatusCommands, ctx: &CommandContext, output: &Output) -> Result<()> {
    match cmd {
        StatusCommands::List { list } => {
            let list_id = ctx.list_id(list)?;
            let mut statuses = ctx
                .api()
                .list_statuses(&list_id)
                .await
                .with_context(|| format!("Failed to fetch statuses of list {list_id}"))?;
            statuses.sort_by_key(|s| s.order);

            if output.is_json() {
                output.data(&statuses);
            } else if statuses.is_empty() {
                println!("No statuses found.");
            } else {
                println!("{:<6} {:<24} {:<10} TYPE", "ORDER", "NAME", "COLOR");
                println!("{}", "-".repeat(50));
                for status in &statuses {
                    println!(
                        "{:<6} {:<24} {:<10} {}",
                        status.order,
                        status.name,
                        status.color.as_deref().unwrap_or("-"),
                        status.kind.as_deref().unwrap_or("-"),
                    );
                }
            }
            Ok(())
        }

        StatusCommands::Add {
            name,
            color,
            order,
            list,
        } => {
            let list_id = ctx.list_id(list)?;
            let spec = StatusSpec {
                name,
                color: Some(color),
                order,
            };
            ctx.api()
                .create_status(&list_id, &spec)
                .await
                .with_context(|| format!("Failed to create status \"{}\"", spec.name))?;
            output.success(&format!("Created status {}", spec.name));
            Ok(())
        }

        StatusCommands::Update {
            name,
            rename,
            color,
            order,
            list,
        } => {
            if rename.is_none() && color.is_none() && order.is_none() {
                bail!("Nothing to update. Pass at least one of --rename, --color, --order");
            }
            let list_id = ctx.list_id(list)?;
            let spec = StatusSpec {
                name: rename.unwrap_or_else(|| name.clone()),
                color,
                order,
            };
            ctx.api()
                .update_status(&list_id, &name, &spec)
                .await
                .with_context(|| format!("Failed to update status \"{name}\""))?;
            output.success(&format!("Updated status {}", spec.name));
            Ok(())
        }

        StatusCommands::Delete { name, list } => {
            let list_id = ctx.list_id(list)?;
            ctx.api()
                .delete_status(&list_id, &name)
                .await
                .with_context(|| format!("Failed to delete status \"{name}\""))?;
            output.success(&format!("Deleted status {name}"));
            Ok(())
        }
    }
}
