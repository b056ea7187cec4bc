//! Bulk apply of a declarative configuration
//!
//! The run has two phases. A gate validates the whole document and reads the
//! remote state it depends on; any failure there aborts before a single
//! mutation is issued. After the gate every item is applied independently and
//! its outcome recorded in an [`ApplyReport`].
//!
//! Tasks are processed depth-first, pre-order, from an explicit stack: a
//! node's children are pushed only once the node itself has been created or
//! updated, so they always receive the parent id the remote assigned. A node
//! that fails takes its whole subtree with it (reported as skipped).

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::backup::BackupWriter;
use super::report::{Action, ApplyReport, Outcome};
use crate::domain::{
    validate, BulkConfig, IntField, ItemKind, Status, Tag, TaskConfig, ValidationError,
};
use crate::remote::{
    due_date_millis, NewTask, RemoteError, StatusSpec, TaskApi, TaskUpdate, Throttle,
};

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Configuration is invalid ({} error(s))", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    #[error("No {0} selected. Pass one explicitly or set a default with `task config`")]
    MissingTarget(&'static str),

    #[error("Failed to read existing {what}: {source}")]
    Remote {
        what: &'static str,
        #[source]
        source: RemoteError,
    },
}

/// Where the document is applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyTarget {
    /// Space owning the tags
    pub space_id: Option<String>,

    /// List owning the statuses and tasks
    pub list_id: Option<String>,
}

impl ApplyTarget {
    pub fn space(&self) -> Result<&str, ApplyError> {
        self.space_id
            .as_deref()
            .ok_or(ApplyError::MissingTarget("space"))
    }

    pub fn list(&self) -> Result<&str, ApplyError> {
        self.list_id
            .as_deref()
            .ok_or(ApplyError::MissingTarget("list"))
    }
}

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Traverse and match, but issue no mutating call
    pub dry_run: bool,

    /// Pause between consecutive sibling subtasks
    pub throttle: Duration,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            throttle: Duration::from_secs(1),
        }
    }
}

/// Lifecycle of one task node
#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeState {
    Pending,
    Matching,
    Creating,
    Updating,
    Applied { id: String },
    Failed { error: String },
}

/// Parent a task node hangs under
#[derive(Debug, Clone, PartialEq, Eq)]
enum Anchor {
    /// Top level of the list
    List,

    /// An existing or freshly created remote task
    Task(String),

    /// A parent that would be created by this (dry) run; nothing can match under it
    Planned,
}

impl Anchor {
    fn remote_id(&self) -> Option<&str> {
        match self {
            Anchor::Task(id) => Some(id),
            _ => None,
        }
    }
}

struct Frame<'c> {
    config: &'c TaskConfig,
    anchor: Anchor,
    depth: usize,
    sibling: usize,
    path: String,
}

/// Existing tasks keyed by (parent id, name)
type TaskIndex = HashMap<(Option<String>, String), String>;

pub struct ApplyEngine<'a, A: TaskApi + ?Sized> {
    api: &'a A,
    target: ApplyTarget,
    options: ApplyOptions,
    backup: Option<BackupWriter>,
}

impl<'a, A: TaskApi + ?Sized> ApplyEngine<'a, A> {
    pub fn new(api: &'a A, target: ApplyTarget, options: ApplyOptions) -> Self {
        Self {
            api,
            target,
            options,
            backup: None,
        }
    }

    /// Snapshot tags and statuses before a real run
    pub fn with_backup(mut self, backup: BackupWriter) -> Self {
        self.backup = Some(backup);
        self
    }

    pub async fn apply(&self, config: &BulkConfig) -> Result<ApplyReport, ApplyError> {
        let errors = validate(config);
        if !errors.is_empty() {
            return Err(ApplyError::ValidationFailed(errors));
        }

        if !config.tags().is_empty() {
            self.target.space()?;
        }
        if !config.statuses().is_empty() || !config.tasks().is_empty() {
            self.target.list()?;
        }

        let existing = if config.tasks().is_empty() {
            TaskIndex::new()
        } else {
            self.index_existing_tasks().await?
        };

        let mut report = ApplyReport::new(self.options.dry_run);
        info!(
            dry_run = self.options.dry_run,
            tags = config.tags().len(),
            statuses = config.statuses().len(),
            tasks = config.task_count(),
            "Applying configuration"
        );

        if !self.options.dry_run {
            if let Some(backup) = &self.backup {
                report.backup = backup.write(self.api, &self.target).await;
            }
        }

        if !config.tags().is_empty() {
            self.apply_tags(config, &mut report).await?;
        }
        if !config.statuses().is_empty() {
            self.apply_statuses(config, &mut report).await?;
        }
        if !config.tasks().is_empty() {
            self.apply_tasks(config.tasks(), existing, &mut report).await?;
        }

        info!("{}", report.summary());
        Ok(report)
    }

    async fn index_existing_tasks(&self) -> Result<TaskIndex, ApplyError> {
        let list_id = self.target.list()?;
        let tasks = self
            .api
            .list_tasks(list_id)
            .await
            .map_err(|source| ApplyError::Remote {
                what: "tasks",
                source,
            })?;

        let mut index = TaskIndex::with_capacity(tasks.len());
        for task in tasks {
            // The listing is newest first; keep the newest of same-named siblings
            index
                .entry((task.parent_id, task.name.trim().to_string()))
                .or_insert(task.id);
        }
        debug!(count = index.len(), "Indexed existing tasks");
        Ok(index)
    }

    async fn apply_tags(&self, config: &BulkConfig, report: &mut ApplyReport) -> Result<(), ApplyError> {
        let space_id = self.target.space()?;

        for tag in config.tags() {
            if self.options.dry_run {
                info!(tag = %tag.name, "Would create tag");
                report.push(ItemKind::Tag, &tag.name, 0, Some(Action::Create), Outcome::Planned);
                continue;
            }

            let remote = Tag {
                name: tag.name.clone(),
                bg_color: tag.bg_color.clone(),
                fg_color: tag.fg_color.clone(),
            };
            let outcome = match self.api.create_tag(space_id, &remote).await {
                Ok(()) => {
                    info!(tag = %tag.name, "Created tag");
                    Outcome::Applied { id: None }
                }
                Err(e) => {
                    warn!(tag = %tag.name, space_id, error = %e, "Failed to create tag");
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.push(ItemKind::Tag, &tag.name, 0, Some(Action::Create), outcome);
        }

        Ok(())
    }

    async fn apply_statuses(
        &self,
        config: &BulkConfig,
        report: &mut ApplyReport,
    ) -> Result<(), ApplyError> {
        let list_id = self.target.list()?;

        let existing: Vec<Status> = match self.api.list_statuses(list_id).await {
            Ok(statuses) => statuses,
            Err(e) => {
                warn!(list_id, error = %e, "Failed to read existing statuses");
                let error = format!("Failed to read existing statuses: {e}");
                for status in config.statuses() {
                    report.push(
                        ItemKind::Status,
                        &status.name,
                        0,
                        None,
                        Outcome::Failed {
                            error: error.clone(),
                        },
                    );
                }
                return Ok(());
            }
        };

        for status in config.statuses() {
            let current = existing.iter().find(|s| s.matches(&status.name));
            let action = if current.is_some() {
                Action::Update
            } else {
                Action::Create
            };

            if self.options.dry_run {
                info!(status = %status.name, "Would {} status", action.as_str());
                report.push(ItemKind::Status, &status.name, 0, Some(action), Outcome::Planned);
                continue;
            }

            let spec = StatusSpec {
                name: status.name.clone(),
                color: Some(status.color.clone()),
                order: status.order.as_ref().and_then(IntField::as_int),
            };
            let result = match current {
                Some(current) => self.api.update_status(list_id, &current.name, &spec).await,
                None => self.api.create_status(list_id, &spec).await,
            };

            let outcome = match result {
                Ok(()) => {
                    info!(status = %status.name, "Status {}d", action.as_str());
                    Outcome::Applied { id: None }
                }
                Err(e) => {
                    warn!(status = %status.name, list_id, error = %e, "Failed to {} status", action.as_str());
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.push(ItemKind::Status, &status.name, 0, Some(action), outcome);
        }

        Ok(())
    }

    async fn apply_tasks(
        &self,
        tasks: &[TaskConfig],
        mut index: TaskIndex,
        report: &mut ApplyReport,
    ) -> Result<(), ApplyError> {
        let list_id = self.target.list()?;
        let mut throttle = Throttle::new(self.options.throttle);

        let mut stack: Vec<Frame<'_>> = tasks
            .iter()
            .enumerate()
            .rev()
            .map(|(sibling, config)| Frame {
                config,
                anchor: Anchor::List,
                depth: 0,
                sibling,
                path: config.name.clone(),
            })
            .collect();

        while let Some(frame) = stack.pop() {
            if frame.depth > 0 && !self.options.dry_run {
                if frame.sibling == 0 {
                    throttle.reset();
                }
                throttle.pace().await;
            }

            let mut state = NodeState::Pending;
            advance(&mut state, NodeState::Matching, &frame.path);

            let key = (
                frame.anchor.remote_id().map(str::to_string),
                frame.config.name.trim().to_string(),
            );
            let matched = match frame.anchor {
                Anchor::Planned => None,
                _ => index.get(&key).cloned(),
            };
            let action = if matched.is_some() {
                Action::Update
            } else {
                Action::Create
            };

            if self.options.dry_run {
                info!(task = %frame.path, depth = frame.depth, "Would {} task", action.as_str());
                report.push(
                    ItemKind::Task,
                    &frame.config.name,
                    frame.depth,
                    Some(action),
                    Outcome::Planned,
                );
                let anchor = matched.map(Anchor::Task).unwrap_or(Anchor::Planned);
                push_children(&mut stack, &frame, anchor);
                continue;
            }

            let result = match &matched {
                Some(task_id) => {
                    advance(&mut state, NodeState::Updating, &frame.path);
                    self.api
                        .update_task(task_id, &task_update(frame.config))
                        .await
                        .map(|_| task_id.clone())
                }
                None => {
                    advance(&mut state, NodeState::Creating, &frame.path);
                    let new_task = new_task(frame.config, frame.anchor.remote_id());
                    self.api
                        .create_task(list_id, &new_task)
                        .await
                        .map(|created| created.id)
                }
            };

            match result {
                Ok(id) => advance(&mut state, NodeState::Applied { id }, &frame.path),
                Err(e) => {
                    warn!(
                        task = %frame.path,
                        parent_id = ?frame.anchor.remote_id(),
                        list_id,
                        error = %e,
                        "Failed to {} task; its subtasks will not be processed",
                        action.as_str()
                    );
                    advance(&mut state, NodeState::Failed { error: e.to_string() }, &frame.path);
                }
            }

            match state {
                NodeState::Applied { id } => {
                    info!(task = %frame.path, id = %id, "Task {}d", action.as_str());
                    if matched.is_none() {
                        index.insert(key, id.clone());
                    }
                    report.push(
                        ItemKind::Task,
                        &frame.config.name,
                        frame.depth,
                        Some(action),
                        Outcome::Applied { id: Some(id.clone()) },
                    );
                    push_children(&mut stack, &frame, Anchor::Task(id));
                }
                NodeState::Failed { error } => {
                    report.push(
                        ItemKind::Task,
                        &frame.config.name,
                        frame.depth,
                        Some(action),
                        Outcome::Failed { error },
                    );
                    skip_subtree(frame.config, frame.depth, report);
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn advance(state: &mut NodeState, next: NodeState, path: &str) {
    debug!(task = %path, from = ?state, to = ?next, "Task state");
    *state = next;
}

fn push_children<'c>(stack: &mut Vec<Frame<'c>>, parent: &Frame<'c>, anchor: Anchor) {
    for (sibling, child) in parent.config.subtasks.iter().enumerate().rev() {
        stack.push(Frame {
            config: child,
            anchor: anchor.clone(),
            depth: parent.depth + 1,
            sibling,
            path: format!("{} > {}", parent.path, child.name),
        });
    }
}

/// Records every descendant of a failed node as skipped, in pre-order
fn skip_subtree(config: &TaskConfig, depth: usize, report: &mut ApplyReport) {
    let mut stack: Vec<(&TaskConfig, usize)> =
        config.subtasks.iter().rev().map(|c| (c, depth + 1)).collect();

    while let Some((task, depth)) = stack.pop() {
        report.push(ItemKind::Task, &task.name, depth, None, Outcome::Skipped);
        stack.extend(task.subtasks.iter().rev().map(|c| (c, depth + 1)));
    }
}

fn priority(config: &TaskConfig) -> Option<u8> {
    config
        .priority
        .as_ref()
        .and_then(IntField::as_int)
        .and_then(|p| u8::try_from(p).ok())
        .filter(|p| (1..=4).contains(p))
}

fn new_task(config: &TaskConfig, parent: Option<&str>) -> NewTask {
    NewTask {
        name: config.name.trim().to_string(),
        description: config.description.clone(),
        priority: priority(config),
        status: config.status.clone(),
        due_date: config.due_date.as_deref().and_then(due_date_millis),
        parent: parent.map(str::to_string),
        tags: config.tags.clone(),
    }
}

fn task_update(config: &TaskConfig) -> TaskUpdate {
    TaskUpdate {
        name: Some(config.name.trim().to_string()),
        description: config.description.clone(),
        priority: priority(config),
        status: config.status.clone(),
        due_date: config.due_date.as_deref().and_then(due_date_millis),
        tags: (!config.tags.is_empty()).then(|| config.tags.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_carries_parent_and_due_date() {
        let mut config = TaskConfig::new("Child", 3).with_status("backlog");
        config.due_date = Some("1970-01-02".to_string());
        config.tags = vec!["api".to_string()];

        let task = new_task(&config, Some("root-id"));
        assert_eq!(task.parent.as_deref(), Some("root-id"));
        assert_eq!(task.priority, Some(3));
        assert_eq!(task.due_date, Some(86_400_000));
        assert_eq!(task.tags, vec!["api".to_string()]);
    }

    #[test]
    fn update_leaves_tags_alone_when_none_given() {
        let update = task_update(&TaskConfig::new("Root", 2));
        assert_eq!(update.name.as_deref(), Some("Root"));
        assert_eq!(update.tags, None);
    }

    #[test]
    fn skipped_subtree_is_pre_order() {
        let root = TaskConfig::new("Root", 1)
            .with_subtask(TaskConfig::new("A", 1).with_subtask(TaskConfig::new("A1", 1)))
            .with_subtask(TaskConfig::new("B", 1));

        let mut report = ApplyReport::new(false);
        skip_subtree(&root, 0, &mut report);

        let items: Vec<_> = report
            .items
            .iter()
            .map(|i| (i.name.as_str(), i.depth))
            .collect();
        assert_eq!(items, vec![("A", 1), ("A1", 2), ("B", 1)]);
        assert_eq!(report.skipped(), 3);
    }

    #[test]
    fn target_reports_what_is_missing() {
        let target = ApplyTarget::default();
        assert!(matches!(target.space(), Err(ApplyError::MissingTarget("space"))));
        assert!(matches!(target.list(), Err(ApplyError::MissingTarget("list"))));
    }
}
