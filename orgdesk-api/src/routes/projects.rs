/// Project endpoints
///
/// - `GET /v1/projects` - Projects with task counts, newest first
/// - `POST /v1/projects` - Create a project
/// - `GET /v1/projects/:project_id` - Project with its tasks

use crate::{error::ApiResult, middleware::identity::ScopedStore};
use axum::{
    extract::Path,
    http::StatusCode,
    Extension, Json,
};
use orgdesk_shared::auth::RequestContext;
use orgdesk_shared::models::project::{Project, ProjectSummary};
use orgdesk_shared::services::projects::{self, ProjectDetail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ListProjectsResponse {
    pub projects: Vec<ProjectSummary>,
}

pub async fn list_projects(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<ListProjectsResponse>> {
    let projects = projects::list_projects(store.as_ref(), &ctx).await?;

    Ok(Json(ListProjectsResponse { projects }))
}

pub async fn create_project(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate()?;

    let project = projects::create_project(store.as_ref(), &ctx, &req.name).await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Project detail; projects of other organizations are 404
pub async fn get_project(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    let detail = projects::get_project(store.as_ref(), &ctx, project_id).await?;

    Ok(Json(detail))
}
