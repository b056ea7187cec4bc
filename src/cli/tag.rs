//! Space tag commands

use anyhow::{Context, Result};
use clap::Subcommand;

use super::context::CommandContext;
use super::output::Output;
use super::parse_color;
use crate::domain::Tag;
use crate::remote::TaskApi;

#[derive(Subcommand)]
pub enum TagCommands {
    /// List tags of a space
    List {
        /// Space ID (defaults to the configured space)
        #[arg(long)]
        space: Option<String>,
    },

    /// Create a tag
    Add {
        name: String,

        /// Background color (#RRGGBB)
        #[arg(long, default_value = "#000000", value_parser = parse_color)]
        bg: String,

        /// Foreground color (#RRGGBB)
        #[arg(long, default_value = "#ffffff", value_parser = parse_color)]
        fg: String,

        #[arg(long)]
        space: Option<String>,
    },

    /// Delete a tag
    Delete {
        name: String,

        #[arg(long)]
        space: Option<String>,
    },
}

pub async fn run(cmd: TagCommands, ctx: &CommandContext, output: &Output) -> Result<()> {
    match cmd {
        TagCommands::List { space } => list(ctx, space, output).await,
        TagCommands::Add {
            name,
            bg,
            fg,
            space,
        } => {
            let space_id = ctx.space_id(space)?;
            let tag = Tag {
                name,
                bg_color: bg,
                fg_color: fg,
            };
            ctx.api()
                .create_tag(&space_id, &tag)
                .await
                .with_context(|| format!("Failed to create tag \"{}\"", tag.name))?;
            output.success(&format!("Created tag {}", tag.name));
            Ok(())
        }
        TagCommands::Delete { name, space } => {
            let space_id = ctx.space_id(space)?;
            ctx.api()
                .delete_tag(&space_id, &name)
                .await
                .with_context(|| format!("Failed to delete tag \"{name}\""))?;
            output.success(&format!("Deleted tag {name}"));
            Ok(())
        }
    }
}

async fn list(ctx: &CommandContext, space: Option<String>, output: &Output) -> Result<()> {
    let space_id = ctx.space_id(space)?;
    let tags = ctx
        .api()
        .list_tags(&space_id)
        .await
        .with_context(|| format!("Failed to fetch tags of space {space_id}"))?;

    if output.is_json() {
        output.data(&tags);
    } else if tags.is_empty() {
        println!("No tags found.");
    } else {
        println!("{:<24} {:<10} FG", "NAME", "BG");
        println!("{}", "-".repeat(44));
        for tag in &tags {
            println!("{:<24} {:<10} {}", tag.name, tag.bg_color, tag.fg_color);
        }
    }
    Ok(())
}
