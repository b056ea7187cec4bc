//! Wire records, one per endpoint envelope
//!
//! Responses are decoded here exactly once. Unknown fields are ignored;
//! missing required fields fail decoding with [`RemoteError::Decode`].
//!
//! [`RemoteError::Decode`]: super::RemoteError::Decode

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::domain::{List, Priority, Space, Status, Tag, TagRef, Task, Workspace};

/// An id the server sends either as a string or as a number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum LooseId {
    Text(String),
    Number(i64),
}

impl From<LooseId> for String {
    fn from(id: LooseId) -> Self {
        match id {
            LooseId::Text(s) => s,
            LooseId::Number(n) => n.to_string(),
        }
    }
}

fn loose_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    LooseId::deserialize(deserializer).map(String::from)
}

/// Numeric values that may arrive quoted ("3" or 3)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(i64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    fn as_i64(&self) -> Option<i64> {
        match self {
            LooseNumber::Number(n) => Some(*n),
            LooseNumber::Float(f) => Some(*f as i64),
            LooseNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Parent reference: a bare id or an object carrying one
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ParentRef {
    Id(LooseId),
    Object { id: LooseId },
}

impl From<ParentRef> for String {
    fn from(parent: ParentRef) -> Self {
        match parent {
            ParentRef::Id(id) | ParentRef::Object { id } => id.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    #[serde(deserialize_with = "loose_id")]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRecord {
    pub status: String,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    orderindex: Option<LooseNumber>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl From<StatusRecord> for Status {
    fn from(record: StatusRecord) -> Self {
        Status {
            name: record.status,
            color: record.color.filter(|c| !c.is_empty()),
            order: record
                .orderindex
                .as_ref()
                .and_then(LooseNumber::as_i64)
                .unwrap_or_default(),
            kind: record.kind,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorityRecord {
    #[serde(default)]
    id: Option<LooseNumber>,

    #[serde(default)]
    priority: Option<String>,
}

impl PriorityRecord {
    fn resolve(&self) -> Option<Priority> {
        self.id
            .as_ref()
            .and_then(LooseNumber::as_i64)
            .and_then(|n| Priority::from_ordinal(n).ok())
            .or_else(|| self.priority.as_deref().and_then(|p| p.parse().ok()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagRecord {
    pub name: String,

    #[serde(default)]
    pub tag_bg: Option<String>,

    #[serde(default)]
    pub tag_fg: Option<String>,
}

impl From<TagRecord> for Tag {
    fn from(record: TagRecord) -> Self {
        Tag {
            name: record.name,
            bg_color: record.tag_bg.unwrap_or_default(),
            fg_color: record.tag_fg.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    #[serde(deserialize_with = "loose_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub text_content: Option<String>,

    pub status: StatusRecord,

    #[serde(default)]
    pub priority: Option<PriorityRecord>,

    #[serde(default)]
    parent: Option<ParentRef>,

    #[serde(default)]
    pub list: Option<IdRef>,

    #[serde(default)]
    pub space: Option<IdRef>,

    #[serde(default)]
    pub tags: Vec<TagRecord>,

    /// Epoch milliseconds
    #[serde(default)]
    date_created: Option<LooseNumber>,

    /// Epoch milliseconds
    #[serde(default)]
    due_date: Option<LooseNumber>,

    #[serde(default)]
    pub url: Option<String>,
}

impl TaskRecord {
    pub fn parent_id(&self) -> Option<String> {
        self.parent.clone().map(String::from)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.date_created.as_ref()?)
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.due_date.as_ref()?)
    }
}

fn millis_to_utc(value: &LooseNumber) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(value.as_i64()?).single()
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let parent_id = record.parent_id();
        let created_at = record.created_at();
        let due_at = record.due_at();
        let priority = record.priority.as_ref().and_then(PriorityRecord::resolve);
        let description = record
            .description
            .or(record.text_content)
            .filter(|d| !d.trim().is_empty());

        Task {
            id: record.id,
            name: record.name,
            description,
            status: record.status.into(),
            priority,
            parent_id,
            list_id: record.list.map(|l| l.id),
            space_id: record.space.map(|s| s.id),
            tags: record
                .tags
                .into_iter()
                .map(|t| TagRef { name: t.name })
                .collect(),
            created_at,
            due_at,
            url: record.url,
        }
    }
}

/// Workspace, space and list records share the `{id, name}` shape
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRecord {
    #[serde(deserialize_with = "loose_id")]
    pub id: String,
    pub name: String,
}

impl From<NamedRecord> for Workspace {
    fn from(r: NamedRecord) -> Self {
        Workspace { id: r.id, name: r.name }
    }
}

impl From<NamedRecord> for Space {
    fn from(r: NamedRecord) -> Self {
        Space { id: r.id, name: r.name }
    }
}

impl From<NamedRecord> for List {
    fn from(r: NamedRecord) -> Self {
        List { id: r.id, name: r.name }
    }
}

#[derive(Debug, Deserialize)]
pub struct TasksEnvelope {
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

/// Mutation replies come either bare or wrapped in `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TaskReply {
    Wrapped { data: TaskRecord },
    Bare(TaskRecord),
}

impl From<TaskReply> for Task {
    fn from(reply: TaskReply) -> Self {
        match reply {
            TaskReply::Wrapped { data } | TaskReply::Bare(data) => data.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SubtasksEnvelope {
    Wrapped { data: TasksEnvelope },
    Bare(TasksEnvelope),
}

impl SubtasksEnvelope {
    pub fn into_tasks(self) -> Vec<TaskRecord> {
        match self {
            SubtasksEnvelope::Wrapped { data } | SubtasksEnvelope::Bare(data) => data.tasks,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusesEnvelope {
    #[serde(default)]
    pub statuses: Vec<StatusRecord>,
}

#[derive(Debug, Deserialize)]
pub struct TagsEnvelope {
    #[serde(default)]
    pub tags: Vec<TagRecord>,
}

#[derive(Debug, Deserialize)]
pub struct TeamsEnvelope {
    #[serde(default)]
    pub teams: Vec<NamedRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SpacesEnvelope {
    #[serde(default)]
    pub spaces: Vec<NamedRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ListsEnvelope {
    #[serde(default)]
    pub lists: Vec<NamedRecord>,
}
