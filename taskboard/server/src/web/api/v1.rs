use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::task::api::v1::{
    ActionResponseJson, CreateTaskRequest, ErrorKindJson, TaskJson, UpdateTaskRequest,
};

/// JSON body returned when a request fails on the server side.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServerErrorResponse {
    /// Human readable description of the failure
    message: String,
}

impl ServerErrorResponse {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::task::api::v1::list_tasks_handler,
        crate::task::api::v1::create_task_handler,
        crate::task::api::v1::update_task_handler,
        crate::task::api::v1::delete_task_handler,
    ),
    components(schemas(
        TaskJson,
        ActionResponseJson,
        ErrorKindJson,
        CreateTaskRequest,
        UpdateTaskRequest,
        ServerErrorResponse,
    )),
    tags((name = "Tasks", description = "Personal task management"))
)]
pub struct ApiDoc;

/// Handler for GET /api-docs/openapi.json.
#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
