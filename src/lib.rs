//! Task CLI - A command-line client for ClickUp
//!
//! Browses workspaces, spaces and lists, manages tasks, statuses and tags,
//! and applies declarative YAML documents describing whole task trees.
//! Remote task listings are flat; [`domain::TaskForest`] rebuilds the
//! hierarchy and [`apply::ApplyEngine`] creates or updates it parent first.

pub mod apply;
pub mod cli;
pub mod domain;
pub mod remote;
pub mod storage;

pub use domain::{BulkConfig, Priority, Task, TaskForest};
