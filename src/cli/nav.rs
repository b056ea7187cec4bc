//! `task workspaces`, `task spaces`, `task lists`

use anyhow::{Context, Result};

use super::context::CommandContext;
use super::output::Output;
use crate::remote::TaskApi;

pub async fn workspaces(ctx: &CommandContext, output: &Output) -> Result<()> {
    let workspaces = ctx
        .api()
        .workspaces()
        .await
        .context("Failed to fetch workspaces")?;

    if output.is_json() {
        output.data(&workspaces);
    } else if workspaces.is_empty() {
        println!("No workspaces found.");
    } else {
        print_table(workspaces.iter().map(|w| (w.id.as_str(), w.name.as_str())));
    }
    Ok(())
}

pub async fn spaces(ctx: &CommandContext, workspace: Option<String>, output: &Output) -> Result<()> {
    let workspace_id = ctx.workspace_id(workspace)?;
    let spaces = ctx
        .api()
        .spaces(&workspace_id)
        .await
        .with_context(|| format!("Failed to fetch spaces of workspace {workspace_id}"))?;

    if output.is_json() {
        output.data(&spaces);
    } else if spaces.is_empty() {
        println!("No spaces found in workspace {}.", workspace_id);
    } else {
        print_table(spaces.iter().map(|s| (s.id.as_str(), s.name.as_str())));
    }
    Ok(())
}

pub async fn lists(ctx: &CommandContext, space: Option<String>, output: &Output) -> Result<()> {
    let space_id = ctx.space_id(space)?;
    let lists = ctx
        .api()
        .lists(&space_id)
        .await
        .with_context(|| format!("Failed to fetch lists of space {space_id}"))?;

    if output.is_json() {
        output.data(&lists);
    } else if lists.is_empty() {
        println!("No lists found in space {}.", space_id);
    } else {
        print_table(lists.iter().map(|l| (l.id.as_str(), l.name.as_str())));
    }
    Ok(())
}

fn print_table<'a>(rows: impl Iterator<Item = (&'a str, &'a str)>) {
    println!("{:<20} NAME", "ID");
    println!("{}", "-".repeat(60));
    for (id, name) in rows {
        println!("{:<20} {}", id, name);
    }
}
