use crate::store::DataStore;
use crate::task::{
    ActionResponse, ErrorKind, NewTask, Task, TaskError, TaskPatch, TaskService, parse_due_date,
};
use crate::web::api::v1::ServerErrorResponse;
use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Shared state of the task routes.
#[derive(Clone, Debug)]
pub struct TaskState {
    pub store: Arc<DataStore>,
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Store-assigned identifier
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    is_completed: bool,
    created_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id().as_uuid(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            due_date: task.due_date(),
            is_completed: task.is_completed(),
            created_at: task.created_at(),
        }
    }
}

/// Classification of a failed operation.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKindJson {
    Validation,
    NotFound,
    ConnectionFailure,
}

impl From<ErrorKind> for ErrorKindJson {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => ErrorKindJson::Validation,
            ErrorKind::NotFound => ErrorKindJson::NotFound,
            ErrorKind::ConnectionFailure => ErrorKindJson::ConnectionFailure,
        }
    }
}

/// Outcome of a create, update or delete call.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponseJson {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<TaskJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKindJson>,
}

impl From<ActionResponse> for ActionResponseJson {
    fn from(response: ActionResponse) -> Self {
        Self {
            success: response.success,
            message: response.message,
            task: response.task.map(TaskJson::from),
            error_kind: response.error_kind.map(ErrorKindJson::from),
        }
    }
}

type ActionReply = (StatusCode, Json<ActionResponseJson>);

/// Status code reported for an outcome; the body is the same either way.
fn status_for(response: &ActionResponse, success_status: StatusCode) -> StatusCode {
    match response.error_kind {
        None => success_status,
        Some(ErrorKind::Validation) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::ConnectionFailure) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn reply(response: ActionResponse, success_status: StatusCode) -> ActionReply {
    let status = status_for(&response, success_status);
    (status, Json(ActionResponseJson::from(response)))
}

/// Request body for creating a task. `_id` and `createdAt` are ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    /// ISO-8601 or `datetime-local` string
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    is_completed: Option<bool>,
}

impl TryFrom<CreateTaskRequest> for NewTask {
    type Error = TaskError;

    fn try_from(request: CreateTaskRequest) -> Result<Self, Self::Error> {
        Ok(NewTask {
            title: request.title.unwrap_or_default(),
            description: request.description,
            due_date: request
                .due_date
                .as_deref()
                .map(parse_due_date_field)
                .transpose()?
                .flatten(),
            is_completed: request.is_completed,
        })
    }
}

/// Request body for a partial update.
///
/// Omitted fields stay unchanged; `null` clears `description` or `dueDate`.
/// `_id` and `createdAt` are ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "present_field")]
    #[schema(value_type = Option<String>)]
    description: Option<Option<String>>,
    /// ISO-8601 or `datetime-local` string
    #[serde(default, deserialize_with = "present_field")]
    #[schema(value_type = Option<String>)]
    due_date: Option<Option<String>>,
    #[serde(default)]
    is_completed: Option<bool>,
}

impl TryFrom<UpdateTaskRequest> for TaskPatch {
    type Error = TaskError;

    fn try_from(request: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let due_date = match request.due_date {
            Some(Some(raw)) => Some(parse_due_date_field(&raw)?),
            Some(None) => Some(None),
            None => None,
        };
        Ok(TaskPatch {
            title: request.title,
            description: request.description,
            due_date,
            is_completed: request.is_completed,
        })
    }
}

/// An unreadable body is a validation failure like any other bad input.
fn read_body<T>(request: Result<Json<T>, JsonRejection>) -> Result<T, TaskError> {
    request
        .map(|Json(body)| body)
        .map_err(|rejection| TaskError::validation(rejection.body_text()))
}

/// Distinguishes an explicit `null` from an omitted field.
fn present_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A blank string means no due date.
fn parse_due_date_field(raw: &str) -> Result<Option<DateTime<Utc>>, TaskError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_due_date(raw)
        .map(Some)
        .ok_or_else(|| TaskError::validation(format!("Invalid due date: {}", raw)))
}

/// Handler for GET /api/v1/tasks - Returns every task, newest first.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = [TaskJson]),
        (status = 500, description = "Internal server error", body = ServerErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<TaskJson>>, (StatusCode, Json<ServerErrorResponse>)> {
    let service = TaskService::new(&state.store);

    match service.list_tasks().await {
        Ok(tasks) => Ok(Json(tasks.into_iter().map(TaskJson::from).collect())),
        Err(err) => {
            tracing::error!("Failed to get tasks: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ServerErrorResponse::new(
                    "Failed to retrieve tasks".to_string(),
                )),
            ))
        }
    }
}

/// Handler for POST /api/v1/tasks - Creates a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = ActionResponseJson),
        (status = 400, description = "Invalid task fields", body = ActionResponseJson),
        (status = 503, description = "Task store unavailable", body = ActionResponseJson)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    request: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ActionReply {
    let response = match read_body(request).and_then(NewTask::try_from) {
        Ok(input) => TaskService::new(&state.store).create(input).await,
        Err(err) => ActionResponse::failed(&err),
    };
    reply(response, StatusCode::CREATED)
}

/// Handler for PATCH /api/v1/tasks/{id} - Applies a partial update.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = String, Path, description = "Identifier of the task to update")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = ActionResponseJson),
        (status = 400, description = "Invalid task ID or fields", body = ActionResponseJson),
        (status = 404, description = "Task not found", body = ActionResponseJson),
        (status = 503, description = "Task store unavailable", body = ActionResponseJson)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
    request: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ActionReply {
    let response = match read_body(request).and_then(TaskPatch::try_from) {
        Ok(patch) => TaskService::new(&state.store).update(&id, patch).await,
        Err(err) => ActionResponse::failed(&err),
    };
    reply(response, StatusCode::OK)
}

/// Handler for DELETE /api/v1/tasks/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = String, Path, description = "Identifier of the task to delete")
    ),
    responses(
        (status = 200, description = "Task deleted", body = ActionResponseJson),
        (status = 400, description = "Invalid task ID", body = ActionResponseJson),
        (status = 404, description = "Task not found", body = ActionResponseJson),
        (status = 503, description = "Task store unavailable", body = ActionResponseJson)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> ActionReply {
    let response = TaskService::new(&state.store).delete(&id).await;
    reply(response, StatusCode::OK)
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            patch(update_task_handler).delete(delete_task_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn can_distinguish_null_from_missing_fields() {
        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        let patch = TaskPatch::try_from(request).unwrap();

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.due_date, None);
        assert_eq!(patch.title, None);
    }

    #[test]
    fn can_ignore_immutable_fields_in_update_body() {
        let request: UpdateTaskRequest = serde_json::from_str(
            r#"{"_id": "abc", "createdAt": "2020-01-01T00:00:00Z", "isCompleted": true}"#,
        )
        .unwrap();
        let patch = TaskPatch::try_from(request).unwrap();

        assert_eq!(patch, TaskPatch::completion(true));
    }

    #[test]
    fn can_parse_datetime_local_due_date_in_create_body() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "Pay rent", "dueDate": "2025-05-01T08:00"}"#)
                .unwrap();
        let input = NewTask::try_from(request).unwrap();

        assert_eq!(
            input.due_date,
            Some(Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn can_treat_blank_due_date_as_absent() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "Pay rent", "dueDate": ""}"#).unwrap();
        let input = NewTask::try_from(request).unwrap();

        assert_eq!(input.due_date, None);
    }

    #[test]
    fn can_reject_malformed_due_date() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "Pay rent", "dueDate": "soon"}"#).unwrap();
        let err = NewTask::try_from(request).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Invalid due date: soon");
    }

    #[test]
    fn can_map_outcome_kinds_to_status_codes() {
        let not_found = ActionResponse::failed(&TaskError::NotFound {
            id: Uuid::nil().into(),
        });
        assert_eq!(status_for(&not_found, StatusCode::OK), StatusCode::NOT_FOUND);

        let offline = ActionResponse::failed(&TaskError::ConnectionFailure {
            message: "down".to_string(),
        });
        assert_eq!(
            status_for(&offline, StatusCode::OK),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let created = ActionResponse::succeeded("ok", None);
        assert_eq!(status_for(&created, StatusCode::CREATED), StatusCode::CREATED);
    }

    #[test]
    fn can_omit_absent_optional_fields_from_task_json() {
        let created_at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let task = Task::new(
            Uuid::nil().into(),
            "Buy milk".to_string(),
            None,
            None,
            false,
            created_at,
        );

        let value = serde_json::to_value(TaskJson::from(task)).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "_id": "00000000-0000-0000-0000-000000000000",
                "title": "Buy milk",
                "isCompleted": false,
                "createdAt": "2025-01-02T03:04:05Z"
            })
        );
    }
}
