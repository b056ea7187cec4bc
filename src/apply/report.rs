//! Per-item results of an apply run

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::ItemKind;

/// What the engine decided to do with an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Dry run: the action would have been taken
    Planned,

    /// Remote call succeeded; tasks carry their id
    Applied {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    Failed { error: String },

    /// Not attempted because an ancestor failed
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyItem {
    pub kind: ItemKind,
    pub name: String,

    /// Nesting level; 0 for tags, statuses and top-level tasks
    pub depth: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub dry_run: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,

    pub items: Vec<ApplyItem>,
}

impl ApplyReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub(crate) fn push(
        &mut self,
        kind: ItemKind,
        name: &str,
        depth: usize,
        action: Option<Action>,
        outcome: Outcome,
    ) {
        self.items.push(ApplyItem {
            kind,
            name: name.to_string(),
            depth,
            action,
            outcome,
        });
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Applied { .. }))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Planned))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Items of one kind, in processing order
    pub fn of_kind(&self, kind: ItemKind) -> impl Iterator<Item = &ApplyItem> {
        self.items.iter().filter(move |i| i.kind == kind)
    }

    pub fn summary(&self) -> String {
        if self.dry_run {
            format!("Dry run: {} change(s) planned, nothing applied", self.planned())
        } else {
            format!(
                "{} applied, {} failed, {} skipped",
                self.applied(),
                self.failed(),
                self.skipped()
            )
        }
    }
}
