//! Client-side orchestration of the task list.
//!
//! Rendering is left to whatever front end drives these types. This module
//! holds the state a task list view works from: the last fetched tasks, which
//! form (if any) is open, the pending notifications, and the form
//! normalization applied before a task reaches the repository operations.

pub mod actions;
pub mod board;
pub mod form;

pub use actions::{LocalTaskActions, TaskActions};
pub use board::{BoardMode, Notification, NotificationLevel, TaskBoard};
pub use form::{FormError, TaskDraft, TaskForm};
