/// Task endpoints
///
/// # Endpoints
///
/// - `POST /v1/projects/:project_id/tasks` - Create a task
/// - `PATCH /v1/projects/:project_id/tasks/:task_id` - Set `completed`
/// - `DELETE /v1/projects/:project_id/tasks/:task_id` - Delete a task
///
/// A task that is not in the given project of the caller's organization
/// is 404 for every method.

use crate::{error::ApiResult, middleware::identity::ScopedStore};
use axum::{
    extract::Path,
    http::StatusCode,
    Extension, Json,
};
use orgdesk_shared::auth::RequestContext;
use orgdesk_shared::models::task::Task;
use orgdesk_shared::services::tasks;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleTaskRequest {
    pub completed: bool,
}

pub async fn create_task(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = tasks::create_task(store.as_ref(), &ctx, project_id, &req.title).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn toggle_task(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ToggleTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = tasks::toggle_task(store.as_ref(), &ctx, task_id, project_id, req.completed).await?;

    Ok(Json(task))
}

pub async fn delete_task(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    tasks::delete_task(store.as_ref(), &ctx, task_id, project_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
