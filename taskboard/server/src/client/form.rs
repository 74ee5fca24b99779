use chrono::{DateTime, Utc};
use std::future::Future;

use crate::task::{NewTask, Task, TaskPatch, format_due_date_input, parse_due_date};

/// Error type for form submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// The title was empty or only whitespace.
    #[error("Title is required")]
    TitleRequired,
    /// The due date was neither ISO-8601 nor a `datetime-local` value.
    #[error("Invalid due date: {0}")]
    InvalidDueDate(String),
}

/// Working copy of a task's editable fields, in their input form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    /// ISO-8601 or `datetime-local` text; blank means no due date.
    pub due_date: String,
    pub is_completed: bool,
}

/// Normalized form contents, ready for a repository operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

impl TaskDraft {
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            is_completed: Some(self.is_completed),
        }
    }

    /// Every field of the form is written, so blank optional fields clear
    /// what was stored before.
    pub fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title),
            description: Some(self.description),
            due_date: Some(self.due_date),
            is_completed: Some(self.is_completed),
        }
    }
}

impl TaskForm {
    /// An empty form for creating a task.
    pub fn new() -> Self {
        Self::default()
    }

    /// A form seeded from an existing task for editing.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title().to_string(),
            description: task.description().unwrap_or_default().to_string(),
            due_date: task.due_date().map(format_due_date_input).unwrap_or_default(),
            is_completed: task.is_completed(),
        }
    }

    /// Validates the title and converts the due date to a timestamp.
    pub fn normalize(&self) -> Result<TaskDraft, FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::TitleRequired);
        }

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => Some(
                parse_due_date(raw).ok_or_else(|| FormError::InvalidDueDate(raw.to_string()))?,
            ),
        };
        let description = Some(self.description.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Ok(TaskDraft {
            title: self.title.clone(),
            description,
            due_date,
            is_completed: self.is_completed,
        })
    }

    /// Normalizes the form and hands the result to `action`.
    ///
    /// `action` is not called when the form is invalid.
    pub async fn submit<F, Fut>(&self, action: F) -> Result<Fut::Output, FormError>
    where
        F: FnOnce(TaskDraft) -> Fut,
        Fut: Future,
    {
        let draft = self.normalize()?;
        Ok(action(draft).await)
    }
}
