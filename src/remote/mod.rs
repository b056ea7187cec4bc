//! Remote task API access
//!
//! Layered bottom-up: [`RemoteClient`] performs authenticated requests under
//! a [`RetryPolicy`], `schema` decodes each endpoint's envelope, and
//! [`TaskApi`] exposes typed operations.

mod api;
mod client;
mod error;
mod retry;
mod schema;

pub use api::{due_date_millis, ClickUpApi, NewTask, StatusSpec, TaskApi, TaskUpdate};
pub use client::{ClientConfig, RemoteClient, DEFAULT_BASE_URL};
pub use error::{RemoteError, Result};
pub use retry::{RetryPolicy, Throttle};
