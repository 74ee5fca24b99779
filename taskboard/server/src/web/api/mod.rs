pub mod v1;

use std::sync::Arc;

use axum::Router;

use crate::task::api::v1::TaskState;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(task_state: Arc<TaskState>) -> Router {
    let tasks_router = crate::task::api::v1::create_api_router(task_state.clone());
    // Unversioned read path.
    let legacy_router = Router::new()
        .route(
            "/api/tasks",
            axum::routing::get(crate::task::api::v1::list_tasks_handler),
        )
        .with_state(task_state);

    Router::new()
        .nest("/api/v1", tasks_router)
        .merge(legacy_router)
        .route(
            "/api-docs/openapi.json",
            axum::routing::get(v1::openapi_handler),
        )
}
