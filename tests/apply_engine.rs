//! Apply engine tests against an in-memory task API
//!
//! The fake keeps a flat task store the way the remote does and records
//! every call, so ordering and parent ids can be asserted exactly.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;

use task_cli::apply::{ApplyEngine, ApplyError, ApplyOptions, ApplyTarget, BackupWriter, Outcome};
use task_cli::domain::{
    BulkConfig, IntField, ItemKind, List, Space, Status, StatusConfig, Tag, TagConfig, Task,
    TaskConfig, Workspace,
};
use task_cli::remote::{NewTask, RemoteError, Result, StatusSpec, TaskApi, TaskUpdate};

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    statuses: Vec<Status>,
    tags: Vec<Tag>,
    calls: Vec<String>,
    next_id: u32,
    /// Task names whose create or update is rejected
    failing: HashSet<String>,
}

#[derive(Default)]
struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    fn with_tasks(tasks: Vec<Task>) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().tasks = tasks;
        api
    }

    fn fail_on(self, name: &str) -> Self {
        self.state.lock().unwrap().failing.insert(name.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list_"))
            .collect()
    }

    fn task_named(&self, name: &str) -> Option<Task> {
        let state = self.state.lock().unwrap();
        state.tasks.iter().find(|t| t.name == name).cloned()
    }

    fn rejected(name: &str) -> RemoteError {
        RemoteError::ValidationRejected {
            status: 400,
            message: format!("cannot save {name}"),
        }
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn list_tasks(&self, list_id: &str) -> Result<Vec<Task>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list_tasks {list_id}"));
        // Newest first, like the remote listing
        Ok(state.tasks.iter().rev().cloned().collect())
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        let state = self.state.lock().unwrap();
        state
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                message: task_id.to_string(),
            })
    }

    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<Task>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.parent_id.as_deref() == Some(task_id))
            .cloned()
            .collect())
    }

    async fn create_task(&self, _list_id: &str, task: &NewTask) -> Result<Task> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!(
            "create {} parent={}",
            task.name,
            task.parent.as_deref().unwrap_or("-")
        ));
        if state.failing.contains(&task.name) {
            return Err(Self::rejected(&task.name));
        }

        state.next_id += 1;
        let mut created = Task::new(format!("new-{}", state.next_id), task.name.clone());
        created.parent_id = task.parent.clone();
        state.tasks.push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("update {task_id}"));
        let name = update.name.clone().unwrap_or_default();
        if state.failing.contains(&name) {
            return Err(Self::rejected(&name));
        }
        state
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                message: task_id.to_string(),
            })
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete {task_id}"));
        state.tasks.retain(|t| t.id != task_id);
        Ok(())
    }

    async fn list_statuses(&self, list_id: &str) -> Result<Vec<Status>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list_statuses {list_id}"));
        Ok(state.statuses.clone())
    }

    async fn create_status(&self, _list_id: &str, status: &StatusSpec) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_status {}", status.name));
        let mut created = Status::named(status.name.clone());
        created.color = status.color.clone();
        state.statuses.push(created);
        Ok(())
    }

    async fn update_status(&self, _list_id: &str, name: &str, _status: &StatusSpec) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("update_status {name}"));
        Ok(())
    }

    async fn delete_status(&self, _list_id: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete_status {name}"));
        Ok(())
    }

    async fn list_tags(&self, space_id: &str) -> Result<Vec<Tag>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list_tags {space_id}"));
        Ok(state.tags.clone())
    }

    async fn create_tag(&self, _space_id: &str, tag: &Tag) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_tag {}", tag.name));
        if state.tags.iter().any(|t| t.name == tag.name) {
            return Err(Self::rejected(&tag.name));
        }
        state.tags.push(tag.clone());
        Ok(())
    }

    async fn delete_tag(&self, _space_id: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete_tag {name}"));
        Ok(())
    }

    async fn workspaces(&self) -> Result<Vec<Workspace>> {
        Ok(Vec::new())
    }

    async fn spaces(&self, _workspace_id: &str) -> Result<Vec<Space>> {
        Ok(Vec::new())
    }

    async fn lists(&self, _space_id: &str) -> Result<Vec<List>> {
        Ok(Vec::new())
    }
}

fn target() -> ApplyTarget {
    ApplyTarget {
        space_id: Some("space-1".to_string()),
        list_id: Some("list-1".to_string()),
    }
}

fn options(dry_run: bool) -> ApplyOptions {
    ApplyOptions {
        dry_run,
        throttle: Duration::ZERO,
    }
}

fn tasks(tasks: Vec<TaskConfig>) -> BulkConfig {
    BulkConfig {
        tasks: Some(tasks),
        ..Default::default()
    }
}

fn root_with_child() -> BulkConfig {
    tasks(vec![
        TaskConfig::new("Root", 2).with_subtask(TaskConfig::new("Child", 3))
    ])
}

// =============================================================================
// Task trees
// =============================================================================

#[tokio::test]
async fn test_creates_parent_before_child_with_parent_id() {
    let api = FakeApi::default();
    let engine = ApplyEngine::new(&api, target(), options(false));

    let report = engine.apply(&root_with_child()).await.unwrap();

    assert_eq!(
        api.mutations(),
        vec!["create Root parent=-", "create Child parent=new-1"]
    );
    let child = api.task_named("Child").unwrap();
    assert_eq!(child.parent_id.as_deref(), Some("new-1"));
    assert_eq!(report.applied(), 2);
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_dry_run_issues_no_mutations() {
    let api = FakeApi::default();
    let config = BulkConfig {
        tags: Some(vec![TagConfig {
            name: "review".to_string(),
            bg_color: "#FF9900".to_string(),
            fg_color: "#FFFFFF".to_string(),
        }]),
        statuses: Some(vec![StatusConfig {
            name: "backlog".to_string(),
            color: "#d3d3d3".to_string(),
            order: Some(IntField::Int(1)),
        }]),
        ..root_with_child()
    };

    let report = ApplyEngine::new(&api, target(), options(true))
        .apply(&config)
        .await
        .unwrap();

    assert!(api.mutations().is_empty());
    assert!(report.dry_run);
    assert_eq!(report.planned(), 4);
    assert_eq!(report.applied(), 0);
    assert!(report.backup.is_none());
}

#[tokio::test]
async fn test_updates_existing_task_matched_by_name_and_parent() {
    let existing = vec![
        Task::new("r1", "Root"),
        Task::new("c1", "Child").with_parent("r1"),
    ];
    let api = FakeApi::with_tasks(existing);

    let report = ApplyEngine::new(&api, target(), options(false))
        .apply(&root_with_child())
        .await
        .unwrap();

    assert_eq!(api.mutations(), vec!["update r1", "update c1"]);
    let ids: Vec<_> = report
        .items
        .iter()
        .map(|i| i.outcome.clone())
        .collect();
    assert_eq!(
        ids,
        vec![
            Outcome::Applied {
                id: Some("r1".to_string())
            },
            Outcome::Applied {
                id: Some("c1".to_string())
            },
        ]
    );
}

#[tokio::test]
async fn test_same_name_under_other_parent_is_not_a_match() {
    // "Child" exists, but at the top level rather than under Root
    let api = FakeApi::with_tasks(vec![Task::new("r1", "Root"), Task::new("x", "Child")]);

    ApplyEngine::new(&api, target(), options(false))
        .apply(&root_with_child())
        .await
        .unwrap();

    assert_eq!(
        api.mutations(),
        vec!["update r1", "create Child parent=r1"]
    );
}

#[tokio::test]
async fn test_failed_parent_skips_subtree_but_siblings_continue() {
    let api = FakeApi::default().fail_on("Broken");
    let config = tasks(vec![
        TaskConfig::new("Broken", 1)
            .with_subtask(TaskConfig::new("Orphan", 1).with_subtask(TaskConfig::new("Deep", 1))),
        TaskConfig::new("Healthy", 1).with_subtask(TaskConfig::new("Leaf", 1)),
    ]);

    let report = ApplyEngine::new(&api, target(), options(false))
        .apply(&config)
        .await
        .unwrap();

    assert_eq!(
        api.mutations(),
        vec![
            "create Broken parent=-",
            "create Healthy parent=-",
            "create Leaf parent=new-1",
        ]
    );
    assert_eq!(report.failed(), 1);
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.applied(), 2);
    assert!(report.has_failures());

    let skipped: Vec<_> = report
        .items
        .iter()
        .filter(|i| i.outcome == Outcome::Skipped)
        .map(|i| (i.name.as_str(), i.depth))
        .collect();
    assert_eq!(skipped, vec![("Orphan", 1), ("Deep", 2)]);
}

#[tokio::test]
async fn test_dry_run_plans_create_under_new_parent() {
    // "Child" exists at the top level; under a parent that does not exist yet
    // nothing can match
    let api = FakeApi::with_tasks(vec![Task::new("x", "Child")]);

    let report = ApplyEngine::new(&api, target(), options(true))
        .apply(&root_with_child())
        .await
        .unwrap();

    let actions: Vec<_> = report
        .items
        .iter()
        .map(|i| (i.name.as_str(), i.action.map(|a| a.as_str())))
        .collect();
    assert_eq!(
        actions,
        vec![("Root", Some("create")), ("Child", Some("create"))]
    );
}

// =============================================================================
// Pacing
// =============================================================================

const PACE: Duration = Duration::from_millis(40);

fn paced() -> ApplyOptions {
    ApplyOptions {
        dry_run: false,
        throttle: PACE,
    }
}

#[tokio::test]
async fn test_sibling_subtasks_are_spaced_out() {
    let api = FakeApi::default();
    let config = tasks(vec![TaskConfig::new("Root", 2)
        .with_subtask(TaskConfig::new("A", 3))
        .with_subtask(TaskConfig::new("B", 3))
        .with_subtask(TaskConfig::new("C", 3))]);

    let started = Instant::now();
    let report = ApplyEngine::new(&api, target(), paced())
        .apply(&config)
        .await
        .unwrap();

    // Three siblings leave two gaps
    assert!(started.elapsed() >= PACE * 2, "took {:?}", started.elapsed());
    assert_eq!(report.applied(), 4);
}

#[tokio::test]
async fn test_top_level_tasks_are_not_paced() {
    let api = FakeApi::default();
    let config = tasks(vec![TaskConfig::new("One", 3), TaskConfig::new("Two", 3)]);

    let started = Instant::now();
    ApplyEngine::new(&api, target(), paced())
        .apply(&config)
        .await
        .unwrap();

    assert!(started.elapsed() < PACE, "took {:?}", started.elapsed());
    assert_eq!(api.mutations().len(), 2);
}

// =============================================================================
// Gate
// =============================================================================

#[tokio::test]
async fn test_invalid_document_makes_no_calls() {
    let api = FakeApi::default();
    let mut bad = TaskConfig::new("Root", 9);
    bad.due_date = Some("next week".to_string());

    let err = ApplyEngine::new(&api, target(), options(false))
        .apply(&tasks(vec![bad]))
        .await
        .unwrap_err();

    match err {
        ApplyError::ValidationFailed(errors) => {
            assert_eq!(errors.len(), 2);
            assert!(errors.iter().all(|e| e.kind == ItemKind::Task));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_missing_list_is_reported_before_any_call() {
    let api = FakeApi::default();
    let target = ApplyTarget {
        space_id: Some("space-1".to_string()),
        list_id: None,
    };

    let err = ApplyEngine::new(&api, target, options(false))
        .apply(&root_with_child())
        .await
        .unwrap_err();

    assert!(matches!(err, ApplyError::MissingTarget("list")));
    assert!(api.calls().is_empty());
}

// =============================================================================
// Tags, statuses and backups
// =============================================================================

#[tokio::test]
async fn test_duplicate_tag_fails_only_that_item() {
    let api = FakeApi::default();
    api.state.lock().unwrap().tags.push(Tag {
        name: "review".to_string(),
        bg_color: "#000000".to_string(),
        fg_color: "#ffffff".to_string(),
    });
    let tag = |name: &str| TagConfig {
        name: name.to_string(),
        bg_color: "#FF9900".to_string(),
        fg_color: "#FFFFFF".to_string(),
    };
    let config = BulkConfig {
        tags: Some(vec![tag("review"), tag("urgent")]),
        ..Default::default()
    };

    let report = ApplyEngine::new(&api, target(), options(false))
        .apply(&config)
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.applied(), 1);
    assert!(matches!(report.items[0].outcome, Outcome::Failed { .. }));
}

#[tokio::test]
async fn test_existing_status_is_updated_new_one_created() {
    let api = FakeApi::default();
    api.state.lock().unwrap().statuses.push(Status::named("Backlog"));
    let status = |name: &str, order: i64| StatusConfig {
        name: name.to_string(),
        color: "#d3d3d3".to_string(),
        order: Some(IntField::Int(order)),
    };
    let config = BulkConfig {
        statuses: Some(vec![status("backlog", 1), status("review", 2)]),
        ..Default::default()
    };

    ApplyEngine::new(&api, target(), options(false))
        .apply(&config)
        .await
        .unwrap();

    assert_eq!(
        api.mutations(),
        vec!["update_status Backlog", "create_status review"]
    );
}

#[tokio::test]
async fn test_real_run_writes_backup_first() {
    let dir = TempDir::new().unwrap();
    let api = FakeApi::default();

    let report = ApplyEngine::new(&api, target(), options(false))
        .with_backup(BackupWriter::new(dir.path().join("backups")))
        .apply(&root_with_child())
        .await
        .unwrap();

    let backup = report.backup.expect("backup path");
    assert!(backup.starts_with(dir.path().join("backups")));
    let content = std::fs::read_to_string(&backup).unwrap();
    assert!(BulkConfig::from_yaml(&content).is_ok());

    // The snapshot reads happen before the first create
    let calls = api.calls();
    let first_create = calls.iter().position(|c| c.starts_with("create")).unwrap();
    let last_read = calls.iter().rposition(|c| c.starts_with("list_tags")).unwrap();
    assert!(last_read < first_create);
}
