//! Typed remote endpoints
//!
//! [`TaskApi`] is the seam everything above the HTTP layer is written
//! against: [`ClickUpApi`] maps each method to one REST endpoint, and tests
//! substitute an in-memory implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

use super::client::RemoteClient;
use super::error::{RemoteError, Result};
use super::schema::{
    ListsEnvelope, SpacesEnvelope, StatusesEnvelope, SubtasksEnvelope, TagsEnvelope, TaskRecord,
    TaskReply, TasksEnvelope, TeamsEnvelope,
};
use crate::domain::{List, Space, Status, Tag, Task, Workspace};

/// Query used for list listings: one page including closed tasks and subtasks, newest first
const LIST_TASKS_QUERY: [(&str, &str); 4] = [
    ("subtasks", "true"),
    ("include_closed", "true"),
    ("order_by", "created"),
    ("reverse", "true"),
];

/// Payload for creating a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordinal 1..=4
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial task update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self == &TaskUpdate::default()
    }
}

/// Payload for creating or replacing a list status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSpec {
    #[serde(rename = "status")]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(rename = "orderindex", skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Converts an ISO `YYYY-MM-DD` date to epoch milliseconds at UTC midnight
pub fn due_date_millis(date: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    /// All tasks of a list, subtasks included, in one call
    async fn list_tasks(&self, list_id: &str) -> Result<Vec<Task>>;

    async fn get_task(&self, task_id: &str) -> Result<Task>;

    /// Direct subtasks of a task
    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<Task>>;

    async fn create_task(&self, list_id: &str, task: &NewTask) -> Result<Task>;

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task>;

    async fn delete_task(&self, task_id: &str) -> Result<()>;

    async fn list_statuses(&self, list_id: &str) -> Result<Vec<Status>>;

    async fn create_status(&self, list_id: &str, status: &StatusSpec) -> Result<()>;

    /// Replaces the status currently named `name`
    async fn update_status(&self, list_id: &str, name: &str, status: &StatusSpec) -> Result<()>;

    async fn delete_status(&self, list_id: &str, name: &str) -> Result<()>;

    async fn list_tags(&self, space_id: &str) -> Result<Vec<Tag>>;

    async fn create_tag(&self, space_id: &str, tag: &Tag) -> Result<()>;

    async fn delete_tag(&self, space_id: &str, name: &str) -> Result<()>;

    async fn workspaces(&self) -> Result<Vec<Workspace>>;

    async fn spaces(&self, workspace_id: &str) -> Result<Vec<Space>>;

    async fn lists(&self, space_id: &str) -> Result<Vec<List>>;
}

/// [`TaskApi`] over the ClickUp v2 REST API
pub struct ClickUpApi {
    client: RemoteClient,
}

impl ClickUpApi {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    fn to_body<T: Serialize>(value: &T) -> Result<Value> {
        serde_json::to_value(value).map_err(|e| RemoteError::BuildError(e.to_string()))
    }
}

fn segment(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

#[async_trait]
impl TaskApi for ClickUpApi {
    async fn list_tasks(&self, list_id: &str) -> Result<Vec<Task>> {
        let envelope: TasksEnvelope = self
            .client
            .send_as(
                Method::GET,
                &format!("list/{}/task", segment(list_id)),
                &LIST_TASKS_QUERY,
                None,
            )
            .await?;
        Ok(envelope.tasks.into_iter().map(Task::from).collect())
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        let record: TaskRecord = self
            .client
            .send_as(
                Method::GET,
                &format!("task/{}", segment(task_id)),
                &[("include_subtasks", "true")],
                None,
            )
            .await?;
        Ok(record.into())
    }

    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<Task>> {
        let envelope: SubtasksEnvelope = self
            .client
            .send_as(
                Method::GET,
                &format!("task/{}/subtask", segment(task_id)),
                &[],
                None,
            )
            .await?;
        Ok(envelope.into_tasks().into_iter().map(Task::from).collect())
    }

    async fn create_task(&self, list_id: &str, task: &NewTask) -> Result<Task> {
        let body = Self::to_body(task)?;
        let reply: TaskReply = self
            .client
            .send_as(
                Method::POST,
                &format!("list/{}/task", segment(list_id)),
                &[],
                Some(&body),
            )
            .await?;
        Ok(reply.into())
    }

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task> {
        let body = Self::to_body(update)?;
        let reply: TaskReply = self
            .client
            .send_as(
                Method::PUT,
                &format!("task/{}", segment(task_id)),
                &[],
                Some(&body),
            )
            .await?;
        Ok(reply.into())
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.client
            .request(Method::DELETE, &format!("task/{}", segment(task_id)), None)
            .await?;
        Ok(())
    }

    async fn list_statuses(&self, list_id: &str) -> Result<Vec<Status>> {
        let envelope: StatusesEnvelope = self
            .client
            .send_as(
                Method::GET,
                &format!("list/{}/status", segment(list_id)),
                &[],
                None,
            )
            .await?;
        Ok(envelope.statuses.into_iter().map(Status::from).collect())
    }

    async fn create_status(&self, list_id: &str, status: &StatusSpec) -> Result<()> {
        let body = Self::to_body(status)?;
        self.client
            .request(
                Method::POST,
                &format!("list/{}/status", segment(list_id)),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    async fn update_status(&self, list_id: &str, name: &str, status: &StatusSpec) -> Result<()> {
        let body = Self::to_body(status)?;
        self.client
            .request(
                Method::PUT,
                &format!("list/{}/status/{}", segment(list_id), segment(name)),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    async fn delete_status(&self, list_id: &str, name: &str) -> Result<()> {
        self.client
            .request(
                Method::DELETE,
                &format!("list/{}/status/{}", segment(list_id), segment(name)),
                None,
            )
            .await?;
        Ok(())
    }

    async fn list_tags(&self, space_id: &str) -> Result<Vec<Tag>> {
        let envelope: TagsEnvelope = self
            .client
            .send_as(
                Method::GET,
                &format!("space/{}/tag", segment(space_id)),
                &[],
                None,
            )
            .await?;
        Ok(envelope.tags.into_iter().map(Tag::from).collect())
    }

    async fn create_tag(&self, space_id: &str, tag: &Tag) -> Result<()> {
        let body = json!({
            "tag": {
                "name": tag.name,
                "tag_bg": tag.bg_color,
                "tag_fg": tag.fg_color,
            }
        });
        self.client
            .request(
                Method::POST,
                &format!("space/{}/tag", segment(space_id)),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    async fn delete_tag(&self, space_id: &str, name: &str) -> Result<()> {
        self.client
            .request(
                Method::DELETE,
                &format!("space/{}/tag/{}", segment(space_id), segment(name)),
                None,
            )
            .await?;
        Ok(())
    }

    async fn workspaces(&self) -> Result<Vec<Workspace>> {
        let envelope: TeamsEnvelope = self.client.send_as(Method::GET, "team", &[], None).await?;
        Ok(envelope.teams.into_iter().map(Workspace::from).collect())
    }

    async fn spaces(&self, workspace_id: &str) -> Result<Vec<Space>> {
        let envelope: SpacesEnvelope = self
            .client
            .send_as(
                Method::GET,
                &format!("team/{}/space", segment(workspace_id)),
                &[],
                None,
            )
            .await?;
        Ok(envelope.spaces.into_iter().map(Space::from).collect())
    }

    async fn lists(&self, space_id: &str) -> Result<Vec<List>> {
        let envelope: ListsEnvelope = self
            .client
            .send_as(
                Method::GET,
                &format!("space/{}/list", segment(space_id)),
                &[],
                None,
            )
            .await?;
        Ok(envelope.lists.into_iter().map(List::from).collect())
    }
}
