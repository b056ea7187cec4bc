//! Declarative bulk configuration document
//!
//! The YAML document consumed by `task apply` and produced by
//! `task export-config`:
//!
//! ```yaml
//! tags:
//!   - name: review
//!     bg_color: "#FF9900"
//!     fg_color: "#FFFFFF"
//! statuses:
//!   - name: backlog
//!     color: "#d3d3d3"
//!     order: 1
//! tasks:
//!   - name: Implement feature
//!     priority: 3
//!     status: backlog
//!     subtasks:
//!       - name: Write tests
//!         priority: 2
//! ```
//!
//! Fields are deliberately loose (`Option`, defaults) so that a malformed
//! document still parses and every problem can be reported by the validator.

use serde::{Deserialize, Serialize};

/// Top-level document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<StatusConfig>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskConfig>>,
}

impl BulkConfig {
    /// Parses a YAML document; an empty document is an empty config
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn tags(&self) -> &[TagConfig] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn statuses(&self) -> &[StatusConfig] {
        self.statuses.as_deref().unwrap_or_default()
    }

    pub fn tasks(&self) -> &[TaskConfig] {
        self.tasks.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.tags().is_empty() && self.statuses().is_empty() && self.tasks().is_empty()
    }

    /// Number of task nodes across every level of nesting
    pub fn task_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&TaskConfig> = self.tasks().iter().collect();
        while let Some(task) = stack.pop() {
            count += 1;
            stack.extend(task.subtasks.iter());
        }
        count
    }
}

/// A tag to create in the default space
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub bg_color: String,

    #[serde(default)]
    pub fg_color: String,
}

/// An integer field exactly as the document wrote it
///
/// `priority: high` or `order: "1"` still parses; the validator reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntField {
    Int(i64),
    Other(serde_yaml::Value),
}

impl IntField {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            IntField::Int(value) => Some(*value),
            IntField::Other(_) => None,
        }
    }

    /// The value as written, for error messages
    pub fn describe(&self) -> String {
        match self {
            IntField::Int(value) => value.to_string(),
            IntField::Other(value) => serde_yaml::to_string(value)
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|_| format!("{value:?}")),
        }
    }
}

impl From<i64> for IntField {
    fn from(value: i64) -> Self {
        IntField::Int(value)
    }
}

/// A status to create or update in the default list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub color: String,

    /// 1-based position; all orders in one document must be exactly 1..=N
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<IntField>,
}

/// A task node; matched to remote tasks by name under the same parent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 1 urgent, 2 high, 3 normal, 4 low
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<IntField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// ISO date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskConfig>,
}

impl TaskConfig {
    pub fn new(name: impl Into<String>, priority: i64) -> Self {
        Self {
            name: name.into(),
            priority: Some(IntField::Int(priority)),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_subtask(mut self, subtask: TaskConfig) -> Self {
        self.subtasks.push(subtask);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_document() {
        let yaml = r##"
tags:
  - name: review
    bg_color: "#FF9900"
    fg_color: "#FFFFFF"
statuses:
  - name: backlog
    color: "#d3d3d3"
    order: 1
tasks:
  - name: Root
    priority: 2
    status: backlog
    tags: [review]
    subtasks:
      - name: Child
        priority: 3
        subtasks:
          - name: Grandchild
            priority: 4
"##;

        let config = BulkConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.tags().len(), 1);
        assert_eq!(config.statuses()[0].order, Some(IntField::Int(1)));
        assert_eq!(config.tasks()[0].tags, vec!["review"]);
        assert_eq!(config.tasks()[0].subtasks[0].subtasks[0].name, "Grandchild");
        assert_eq!(config.task_count(), 3);
    }

    #[test]
    fn missing_fields_still_parse() {
        let config = BulkConfig::from_yaml("tasks:\n  - description: no name\n").unwrap();
        let task = &config.tasks()[0];
        assert!(task.name.is_empty());
        assert_eq!(task.priority, None);
    }

    #[test]
    fn non_integer_numbers_still_parse() {
        let yaml = "statuses:\n  - name: a\n    order: \"1\"\ntasks:\n  - name: A\n    priority: high\n";
        let config = BulkConfig::from_yaml(yaml).unwrap();

        let priority = config.tasks()[0].priority.as_ref().unwrap();
        assert_eq!(priority.as_int(), None);
        assert_eq!(priority.describe(), "high");

        let order = config.statuses()[0].order.as_ref().unwrap();
        assert_eq!(order.as_int(), None);
        assert!(order.describe().contains('1'));
    }

    #[test]
    fn empty_document_is_empty_config() {
        assert!(BulkConfig::from_yaml("").unwrap().is_empty());
        assert!(BulkConfig::from_yaml("  \n").unwrap().is_empty());
    }

    #[test]
    fn serializes_without_empty_sections() {
        let config = BulkConfig {
            tags: Some(vec![TagConfig {
                name: "bug".to_string(),
                bg_color: "#FF0000".to_string(),
                fg_color: "#FFFFFF".to_string(),
            }]),
            ..Default::default()
        };

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("tags:"));
        assert!(!yaml.contains("statuses"));
        assert!(!yaml.contains("tasks"));
    }
}
