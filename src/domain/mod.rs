//! Domain models for the task CLI
//!
//! Contains the core business logic without any I/O concerns.

mod bulk;
mod resource;
mod task;
mod tree;
mod validate;

pub use bulk::{BulkConfig, IntField, StatusConfig, TagConfig, TaskConfig};
pub use resource::{is_hex_color, List, Space, Status, Tag, TagRef, Workspace};
pub use task::{Priority, PriorityError, Task};
pub use tree::{NodeId, StructuralIssue, TaskForest, TaskNode, Visit};
pub use validate::{validate, ItemKind, ValidationError};
