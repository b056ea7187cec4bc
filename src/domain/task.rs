//! Task view model
//!
//! Tasks live on the remote service; this is the local, strongly-typed
//! view of one task record after it has been decoded at the client boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::resource::{Status, TagRef};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriorityError {
    #[error("Priority must be a number between 1 and 4 (got {0})")]
    OutOfRange(i64),

    #[error("Unknown priority: {0}")]
    Unknown(String),
}

/// Task priority, ordinal 1 (most urgent) through 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Urgent,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    /// Maps the remote ordinal (1..=4) to a priority
    pub fn from_ordinal(ordinal: i64) -> Result<Self, PriorityError> {
        match ordinal {
            1 => Ok(Priority::Urgent),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Normal),
            4 => Ok(Priority::Low),
            other => Err(PriorityError::OutOfRange(other)),
        }
    }

    pub fn ordinal(&self) -> u8 {
        match self {
            Priority::Urgent => 1,
            Priority::High => 2,
            Priority::Normal => 3,
            Priority::Low => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either the ordinal ("2") or the label ("high")
impl FromStr for Priority {
    type Err = PriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Self::from_ordinal(n);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PriorityError::Unknown(trimmed.to_string()))
    }
}

/// A task as returned by the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned, immutable
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Parent task in the same list (None for top-level tasks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,

    #[serde(default)]
    pub tags: Vec<TagRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Task {
    /// Creates a minimal task (used by tests and fakes)
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            status: Status::named("to do"),
            priority: None,
            parent_id: None,
            list_id: None,
            space_id: None,
            tags: Vec::new(),
            created_at: None,
            due_at: None,
            url: None,
        }
    }

    /// Sets the parent reference
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Sets the creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Returns the first non-empty line of the description
    pub fn summary_line(&self) -> Option<&str> {
        self.description
            .as_deref()
            .and_then(|d| d.lines().map(str::trim).find(|l| !l.is_empty()))
    }

    /// Returns the priority label, or "none" when unset
    pub fn priority_label(&self) -> &'static str {
        self.priority.map(|p| p.label()).unwrap_or("none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordinals_round_trip() {
        for p in Priority::ALL {
            assert_eq!(Priority::from_ordinal(p.ordinal() as i64), Ok(p));
        }
        assert_eq!(Priority::from_ordinal(0), Err(PriorityError::OutOfRange(0)));
        assert_eq!(Priority::from_ordinal(5), Err(PriorityError::OutOfRange(5)));
    }

    #[test]
    fn priority_parses_label_or_number() {
        assert_eq!("2".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("URGENT".parse::<Priority>(), Ok(Priority::Urgent));
        assert!("someday".parse::<Priority>().is_err());
    }

    #[test]
    fn summary_line_skips_blank_lines() {
        let mut task = Task::new("t1", "Write docs");
        task.description = Some("\n  \nFirst real line\nsecond".to_string());
        assert_eq!(task.summary_line(), Some("First real line"));
    }
}
