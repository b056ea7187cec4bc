//! Task commands: list, get, add, update, delete

use anyhow::{anyhow, bail, Context, Result};
use colored::{ColoredString, Colorize};
use serde_json::json;
use tracing::debug;

use super::context::CommandContext;
use super::output::Output;
use crate::domain::{Priority, Task, TaskForest};
use crate::remote::{NewTask, TaskApi, TaskUpdate};

/// Filters for `task list`
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Show only this task and its subtree
    pub task: Option<String>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
}

impl ListFilter {
    fn has_predicates(&self) -> bool {
        self.status.is_some() || self.priority.is_some()
    }

    fn matches(&self, task: &Task) -> bool {
        let status_ok = self
            .status
            .as_deref()
            .map_or(true, |s| task.status.matches(s));
        let priority_ok = self.priority.map_or(true, |p| task.priority == Some(p));
        status_ok && priority_ok
    }
}

pub async fn list(
    ctx: &CommandContext,
    list: Option<String>,
    filter: ListFilter,
    output: &Output,
) -> Result<()> {
    let list_id = ctx.list_id(list)?;
    let tasks = ctx
        .api()
        .list_tasks(&list_id)
        .await
        .with_context(|| format!("Failed to fetch tasks of list {list_id}"))?;
    debug!(count = tasks.len(), "Fetched tasks");

    let forest = TaskForest::build(tasks);
    for issue in forest.issues() {
        output.warning(&issue.to_string());
    }

    let visits = match &filter.task {
        Some(id) => {
            let node = forest
                .find(id)
                .ok_or_else(|| anyhow!("Task {id} not found in list {list_id}"))?;
            forest.walk_from(&[node])
        }
        None => forest.walk(),
    };
    let visits = if filter.has_predicates() {
        forest.retain_matching(&visits, |t| filter.matches(t))
    } else {
        visits
    };

    if output.is_json() {
        output.data(&forest.to_nodes(&visits));
        return Ok(());
    }

    if visits.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    for visit in &visits {
        let task = forest.task(visit.node);
        let dimmed = filter.has_predicates() && !filter.matches(task);
        println!("{}", task_line(task, visit.depth, dimmed));
    }
    println!();
    println!("{} task(s)", visits.len());

    Ok(())
}

fn task_line(task: &Task, depth: usize, context_only: bool) -> String {
    let indent = "  ".repeat(depth);
    let marker = if depth == 0 { "•" } else { "↳" };
    let name = if context_only {
        task.name.dimmed()
    } else if depth == 0 {
        task.name.bold()
    } else {
        task.name.normal()
    };

    format!(
        "{}{} {} {}  {} · {}",
        indent,
        marker,
        name,
        format!("[{}]", task.id).dimmed(),
        status_label(task),
        priority_label(task.priority),
    )
}

fn status_label(task: &Task) -> ColoredString {
    if task.status.is_closed() {
        task.status.name.green()
    } else {
        task.status.name.cyan()
    }
}

fn priority_label(priority: Option<Priority>) -> ColoredString {
    match priority {
        Some(Priority::Urgent) => "urgent".red().bold(),
        Some(Priority::High) => "high".yellow(),
        Some(Priority::Normal) => "normal".blue(),
        Some(Priority::Low) => "low".dimmed(),
        None => "no priority".dimmed(),
    }
}

pub async fn get(ctx: &CommandContext, id: &str, output: &Output) -> Result<()> {
    let api = ctx.api();
    let task = api
        .get_task(id)
        .await
        .with_context(|| format!("Failed to fetch task {id}"))?;

    let parent = match &task.parent_id {
        Some(parent_id) => match api.get_task(parent_id).await {
            Ok(parent) => Some(parent),
            Err(e) => {
                debug!(parent_id = %parent_id, error = %e, "Parent lookup failed");
                None
            }
        },
        None => None,
    };

    let subtasks = match api.list_subtasks(id).await {
        Ok(subtasks) => subtasks,
        Err(e) => {
            output.warning(&format!("Could not fetch subtasks: {e}"));
            Vec::new()
        }
    };

    if output.is_json() {
        output.data(&json!({
            "task": task,
            "parent": parent,
            "subtasks": subtasks,
        }));
        return Ok(());
    }

    println!("{} {}", task.name.bold(), format!("[{}]", task.id).dimmed());
    println!("Status:   {}", status_label(&task));
    println!("Priority: {}", priority_label(task.priority));
    if let Some(created) = task.created_at {
        println!("Created:  {}", created.format("%Y-%m-%d %H:%M"));
    }
    if let Some(due) = task.due_at {
        println!("Due:      {}", due.format("%Y-%m-%d"));
    }
    match (&parent, &task.parent_id) {
        (Some(parent), _) => println!("Parent:   {} [{}]", parent.name, parent.id),
        (None, Some(parent_id)) => println!("Parent:   [{}]", parent_id),
        _ => {}
    }
    if !task.tags.is_empty() {
        let tags: Vec<_> = task.tags.iter().map(|t| t.name.as_str()).collect();
        println!("Tags:     {}", tags.join(", "));
    }
    if let Some(url) = &task.url {
        println!("URL:      {}", url);
    }
    if let Some(description) = &task.description {
        println!();
        println!("{}", description);
    }
    if !subtasks.is_empty() {
        println!();
        println!("Subtasks ({}):", subtasks.len());
        for subtask in &subtasks {
            println!("{}", task_line(subtask, 1, false));
        }
    }

    Ok(())
}

/// Arguments of `task add`
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Option<String>,
    pub parent: Option<String>,
    pub list: Option<String>,
}

pub async fn add(ctx: &CommandContext, args: AddArgs, output: &Output) -> Result<()> {
    let api = ctx.api();

    // Subtasks live in their parent's list
    let list_id = match &args.parent {
        Some(parent_id) => {
            let parent = api
                .get_task(parent_id)
                .await
                .with_context(|| format!("Failed to fetch parent task {parent_id}"))?;
            ctx.list_id(parent.list_id.or(args.list))?
        }
        None => ctx.list_id(args.list)?,
    };

    let new_task = NewTask {
        description: args.description,
        priority: Some(args.priority.ordinal()),
        status: args.status,
        parent: args.parent,
        ..NewTask::new(args.name)
    };
    let created = api
        .create_task(&list_id, &new_task)
        .await
        .with_context(|| format!("Failed to create task \"{}\"", new_task.name))?;

    if output.is_json() {
        output.data(&created);
    } else {
        output.success(&format!("Created task {} [{}]", created.name, created.id));
    }
    Ok(())
}

/// Arguments of `task update`
#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<String>,
}

pub async fn update(ctx: &CommandContext, id: &str, args: UpdateArgs, output: &Output) -> Result<()> {
    let update = TaskUpdate {
        name: args.name,
        description: args.description,
        priority: args.priority.map(|p| p.ordinal()),
        status: args.status,
        ..Default::default()
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass at least one of --name, --description, --priority, --status");
    }

    let task = ctx
        .api()
        .update_task(id, &update)
        .await
        .with_context(|| format!("Failed to update task {id}"))?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Updated task {} [{}]", task.name, task.id));
    }
    Ok(())
}

pub async fn delete(ctx: &CommandContext, id: &str, force: bool, output: &Output) -> Result<()> {
    if !force {
        bail!("Refusing to delete task {id} without --force");
    }

    ctx.api()
        .delete_task(id)
        .await
        .with_context(|| format!("Failed to delete task {id}"))?;

    output.success(&format!("Deleted task {id}"));
    Ok(())
}
