//! Remote state as a declarative document
//!
//! The output of [`export_config`] is a [`BulkConfig`] that validates and can
//! be applied back, which is also what pre-apply backups are made of.

use tracing::debug;

use super::engine::{ApplyError, ApplyTarget};
use crate::domain::{
    BulkConfig, IntField, Priority, StatusConfig, TagConfig, TaskConfig, TaskForest, Visit,
};
use crate::remote::TaskApi;

const DEFAULT_STATUS_COLOR: &str = "#000000";

/// Sections to include in an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSelection {
    pub tags: bool,
    pub statuses: bool,
    pub tasks: bool,
}

impl ExportSelection {
    pub fn all() -> Self {
        Self {
            tags: true,
            statuses: true,
            tasks: true,
        }
    }

    pub fn tags() -> Self {
        Self {
            tags: true,
            statuses: false,
            tasks: false,
        }
    }

    pub fn statuses() -> Self {
        Self {
            tags: false,
            statuses: true,
            tasks: false,
        }
    }

    pub fn tasks() -> Self {
        Self {
            tags: false,
            statuses: false,
            tasks: true,
        }
    }
}

pub async fn export_config<A: TaskApi + ?Sized>(
    api: &A,
    target: &ApplyTarget,
    selection: ExportSelection,
) -> Result<BulkConfig, ApplyError> {
    let mut config = BulkConfig::default();

    if selection.tags {
        let space_id = target.space()?;
        let tags = api
            .list_tags(space_id)
            .await
            .map_err(|source| ApplyError::Remote { what: "tags", source })?;
        config.tags = Some(
            tags.into_iter()
                .map(|t| TagConfig {
                    name: t.name,
                    bg_color: t.bg_color,
                    fg_color: t.fg_color,
                })
                .collect(),
        );
    }

    if selection.statuses {
        let list_id = target.list()?;
        let mut statuses = api
            .list_statuses(list_id)
            .await
            .map_err(|source| ApplyError::Remote {
                what: "statuses",
                source,
            })?;
        statuses.sort_by_key(|s| s.order);

        // Remote order indexes start at 0 and may have gaps
        config.statuses = Some(
            statuses
                .into_iter()
                .enumerate()
                .map(|(i, s)| StatusConfig {
                    name: s.name,
                    color: s.color.unwrap_or_else(|| DEFAULT_STATUS_COLOR.to_string()),
                    order: Some(IntField::Int(i as i64 + 1)),
                })
                .collect(),
        );
    }

    if selection.tasks {
        let list_id = target.list()?;
        let tasks = api
            .list_tasks(list_id)
            .await
            .map_err(|source| ApplyError::Remote { what: "tasks", source })?;
        let forest = TaskForest::build(tasks);
        config.tasks = Some(task_configs(&forest, &forest.walk()));
    }

    debug!(
        tags = config.tags().len(),
        statuses = config.statuses().len(),
        tasks = config.task_count(),
        "Exported configuration"
    );
    Ok(config)
}

/// Nested task documents from pre-order visits
pub fn task_configs(forest: &TaskForest, visits: &[Visit]) -> Vec<TaskConfig> {
    let mut roots = Vec::new();
    let mut open: Vec<TaskConfig> = Vec::new();

    for visit in visits {
        while open.len() > visit.depth {
            close_top(&mut open, &mut roots);
        }
        open.push(task_config(forest, visit));
    }
    while !open.is_empty() {
        close_top(&mut open, &mut roots);
    }

    roots
}

fn task_config(forest: &TaskForest, visit: &Visit) -> TaskConfig {
    let task = forest.task(visit.node);
    TaskConfig {
        name: task.name.clone(),
        description: task.description.clone(),
        // Priority is required on apply; unset tasks export as normal
        priority: Some(IntField::Int(i64::from(
            task.priority.unwrap_or(Priority::Normal).ordinal(),
        ))),
        status: Some(task.status.name.clone()),
        // Due dates are UTC midnight on the way in
        due_date: task.due_at.map(|due| due.format("%Y-%m-%d").to_string()),
        tags: task.tags.iter().map(|t| t.name.clone()).collect(),
        subtasks: Vec::new(),
    }
}

fn close_top(open: &mut Vec<TaskConfig>, roots: &mut Vec<TaskConfig>) {
    if let Some(done) = open.pop() {
        match open.last_mut() {
            Some(parent) => parent.subtasks.push(done),
            None => roots.push(done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{validate, Task};
    use chrono::{TimeZone, Utc};

    #[test]
    fn nests_tasks_by_parent() {
        let mut root = Task::new("r", "Root");
        root.priority = Some(Priority::High);
        let child = Task::new("c", "Child").with_parent("r");
        let grandchild = Task::new("g", "Grandchild").with_parent("c");
        let other = Task::new("o", "Other");

        let forest = TaskForest::build(vec![root, child, grandchild, other]);
        let configs = task_configs(&forest, &forest.walk());

        assert_eq!(configs.len(), 2);
        let root = configs.iter().find(|c| c.name == "Root").unwrap();
        assert_eq!(root.priority, Some(IntField::Int(2)));
        assert_eq!(root.status.as_deref(), Some("to do"));
        assert_eq!(root.subtasks[0].name, "Child");
        assert_eq!(root.subtasks[0].subtasks[0].name, "Grandchild");
        assert_eq!(root.subtasks[0].priority, Some(IntField::Int(3)));
    }

    #[test]
    fn due_dates_survive_export() {
        let mut task = Task::new("r", "Root");
        task.due_at = Utc.timestamp_millis_opt(1_708_041_600_000).single();

        let forest = TaskForest::build(vec![task, Task::new("o", "Open ended")]);
        let configs = task_configs(&forest, &forest.walk());

        let root = configs.iter().find(|c| c.name == "Root").unwrap();
        assert_eq!(root.due_date.as_deref(), Some("2024-02-16"));
        let other = configs.iter().find(|c| c.name == "Open ended").unwrap();
        assert_eq!(other.due_date, None);

        let document = BulkConfig {
            tasks: Some(configs),
            ..Default::default()
        };
        assert!(validate(&document).is_empty());
    }
}
