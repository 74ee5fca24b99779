use crate::entities::task;
use crate::store::{ConnectionError, DataStore};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use sea_orm::*;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub mod api;

pub const INVALID_TASK_ID: &str = "Invalid task ID";
pub const TASK_NOT_FOUND: &str = "Task not found";
pub const TASK_CREATED: &str = "Task created successfully";
pub const TASK_UPDATED: &str = "Task updated successfully";
pub const TASK_DELETED: &str = "Task deleted successfully";

/// Store-assigned identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Validates `raw` against the identifier format.
    pub fn parse(raw: &str) -> Result<Self, TaskError> {
        Uuid::parse_str(raw.trim())
            .map(TaskId)
            .map_err(|_| TaskError::InvalidId {
                id: raw.to_string(),
            })
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TaskId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for TaskId {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    is_completed: bool,
    created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: TaskId,
        title: String,
        description: Option<String>,
        due_date: Option<DateTime<Utc>>,
        is_completed: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            due_date,
            is_completed,
            created_at,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            TaskId(model.id),
            model.title,
            model.description,
            model.due_date,
            model.is_completed,
            model.created_at,
        )
    }
}

/// Input for creating a task. The store assigns the id and creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Defaults to `false` when absent.
    pub is_completed: Option<bool>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = Some(is_completed);
        self
    }
}

/// Partial update of a task's mutable fields.
///
/// `None` leaves a field untouched. For the optional fields, `Some(None)`
/// clears the stored value. The id and creation time cannot be expressed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    /// A patch that only sets the completion flag.
    pub fn completion(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.is_completed.is_none()
    }
}

/// Coarse classification of a [`TaskError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    ConnectionFailure,
}

/// Error type for task operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The input broke a field rule, such as a blank title.
    #[error("{message}")]
    Validation { message: String },
    /// The identifier does not match the store's identifier format.
    #[error("Invalid task ID")]
    InvalidId { id: String },
    /// The identifier is well formed but no task carries it.
    #[error("Task not found")]
    NotFound { id: TaskId },
    /// The store could not be reached.
    #[error("{message}")]
    ConnectionFailure { message: String },
    /// Any other store failure, with the store's own message.
    #[error("{message}")]
    Store { message: String },
}

impl TaskError {
    pub fn validation(message: impl Into<String>) -> Self {
        TaskError::Validation {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::Validation { .. } | TaskError::InvalidId { .. } => ErrorKind::Validation,
            TaskError::NotFound { .. } => ErrorKind::NotFound,
            TaskError::ConnectionFailure { .. } | TaskError::Store { .. } => {
                ErrorKind::ConnectionFailure
            }
        }
    }
}

impl From<ConnectionError> for TaskError {
    fn from(err: ConnectionError) -> Self {
        TaskError::ConnectionFailure {
            message: err.to_string(),
        }
    }
}

impl From<DbErr> for TaskError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Custom(message) if message == task::TITLE_REQUIRED => {
                TaskError::Validation { message }
            }
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => TaskError::ConnectionFailure {
                message: err.to_string(),
            },
            other => TaskError::Store {
                message: other.to_string(),
            },
        }
    }
}

/// Uniform outcome of a mutating task operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub success: bool,
    pub message: Option<String>,
    pub task: Option<Task>,
    pub error_kind: Option<ErrorKind>,
}

impl ActionResponse {
    pub fn succeeded(message: &str, task: Option<Task>) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            task,
            error_kind: None,
        }
    }

    pub fn failed(err: &TaskError) -> Self {
        Self {
            success: false,
            message: Some(err.to_string()),
            task: None,
            error_kind: Some(err.kind()),
        }
    }

    fn from_result(result: Result<Task, TaskError>, message: &str) -> Self {
        match result {
            Ok(task) => Self::succeeded(message, Some(task)),
            Err(err) => Self::failed(&err),
        }
    }
}

/// Parses the transport form of a due date.
///
/// Accepts RFC 3339 timestamps, `datetime-local` values (`YYYY-MM-DDTHH:MM`
/// with optional seconds) and bare dates. Values without an offset are UTC.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Renders a due date in the `datetime-local` form.
pub fn format_due_date_input(due_date: DateTime<Utc>) -> String {
    due_date.format("%Y-%m-%dT%H:%M").to_string()
}

/// Timestamps are kept at microsecond precision, the finest every backend stores.
fn stored_precision(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(6)
}

/// An empty description is stored as no description.
fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|text| !text.trim().is_empty())
}

pub struct TaskService<'a> {
    store: &'a DataStore,
}

impl<'a> TaskService<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        TaskService { store }
    }

    /// Creates a task and reports the uniform outcome.
    pub async fn create(&self, input: NewTask) -> ActionResponse {
        let result = self.create_task(input).await;
        log_failure("create", result.as_ref().err());
        ActionResponse::from_result(result, TASK_CREATED)
    }

    /// Applies a partial update and reports the uniform outcome.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> ActionResponse {
        let result = self.update_task(id, patch).await;
        log_failure("update", result.as_ref().err());
        ActionResponse::from_result(result, TASK_UPDATED)
    }

    /// Deletes a task and reports the uniform outcome.
    pub async fn delete(&self, id: &str) -> ActionResponse {
        let result = self.delete_task(id).await;
        log_failure("delete", result.as_ref().err());
        match result {
            Ok(_) => ActionResponse::succeeded(TASK_DELETED, None),
            Err(err) => ActionResponse::failed(&err),
        }
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `input` - The task fields. Any creation time the caller has in mind is
    ///   ignored; the current time is recorded instead.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task`, including its generated id.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, input: NewTask) -> Result<Task, TaskError> {
        let db = self.store.connect().await?;

        let active_model = task::ActiveModel {
            title: ActiveValue::Set(input.title),
            description: ActiveValue::Set(normalize_description(input.description)),
            due_date: ActiveValue::Set(input.due_date.map(stored_precision)),
            is_completed: ActiveValue::Set(input.is_completed.unwrap_or(false)),
            created_at: ActiveValue::Set(stored_precision(Utc::now())),
            ..Default::default()
        };
        let created_model = active_model.insert(db).await?;
        Ok(Task::from(created_model))
    }

    /// Applies `patch` to the task with the given id.
    ///
    /// # Arguments
    ///
    /// * `id` - The raw identifier; it must match the identifier format.
    /// * `patch` - The fields to change. Unspecified fields are left as they are.
    ///
    /// # Returns
    ///
    /// A `Result` containing the task as stored after the update.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
        let db = self.store.connect().await?;
        let id = TaskId::parse(id)?;

        let task_to_update = task::Entity::find_by_id(id.as_uuid())
            .one(db)
            .await?
            .ok_or(TaskError::NotFound { id })?;
        if patch.is_empty() {
            return Ok(Task::from(task_to_update));
        }

        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(title) = patch.title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = patch.description {
            active_model.description = ActiveValue::Set(normalize_description(description));
        }
        if let Some(due_date) = patch.due_date {
            active_model.due_date = ActiveValue::Set(due_date.map(stored_precision));
        }
        if let Some(is_completed) = patch.is_completed {
            active_model.is_completed = ActiveValue::Set(is_completed);
        }

        let updated_model = active_model.update(db).await.map_err(|err| match err {
            DbErr::RecordNotUpdated => TaskError::NotFound { id },
            other => TaskError::from(other),
        })?;
        Ok(Task::from(updated_model))
    }

    /// Deletes the task with the given id.
    ///
    /// Deleting an id a second time reports `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: &str) -> Result<TaskId, TaskError> {
        let db = self.store.connect().await?;
        let id = TaskId::parse(id)?;

        let result = task::Entity::delete_by_id(id.as_uuid()).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(TaskError::NotFound { id });
        }
        Ok(id)
    }

    /// Retrieves every task, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        let db = self.store.connect().await?;
        let tasks = task::Entity::find()
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }
}

fn log_failure(operation: &str, err: Option<&TaskError>) {
    match err.map(|err| (err.kind(), err)) {
        Some((ErrorKind::ConnectionFailure, err)) => {
            tracing::error!("Failed to {} task: {}", operation, err)
        }
        Some((_, err)) => tracing::warn!("Failed to {} task: {}", operation, err),
        None => {}
    }
}
