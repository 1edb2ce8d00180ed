/// Projects
///
/// Every project belongs to the caller's resolved organization; ids from
/// other organizations behave exactly like ids that do not exist.

use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::{audit, required_text};
use crate::auth::RequestContext;
use crate::error::{StoreContext, TenancyError, TenancyResult};
use crate::models::audit_log::{actions, entities, AuditEntry};
use crate::models::project::{CreateProject, Project, ProjectSummary, MAX_NAME_LENGTH};
use crate::models::task::Task;
use crate::store::TenancyStore;

/// A project with its tasks, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

/// Creates a project in the caller's organization
pub async fn create_project(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
    raw_name: &str,
) -> TenancyResult<Project> {
    let (principal, org) = ctx.require_member()?;
    let name = required_text("name", raw_name, MAX_NAME_LENGTH)?;

    let project = store
        .insert_project(CreateProject {
            org_id: org.org_id,
            name,
        })
        .await
        .during("create project")?;

    audit::record(
        store,
        AuditEntry::new(org.org_id, Some(principal.user_id), actions::PROJECT_CREATED)
            .entity(entities::PROJECT, project.id)
            .metadata(json!({ "name": project.name })),
    )
    .await;

    info!(org_id = %org.org_id, project_id = %project.id, "Project created");
    Ok(project)
}

/// Projects of the caller's organization with task counts, newest first
pub async fn list_projects(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
) -> TenancyResult<Vec<ProjectSummary>> {
    let (_, org) = ctx.require_member()?;

    store.list_projects(org.org_id).await.during("list projects")
}

/// One project of the caller's organization with its tasks
pub async fn get_project(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
    project_id: Uuid,
) -> TenancyResult<ProjectDetail> {
    let (_, org) = ctx.require_member()?;

    let project = store
        .find_project(org.org_id, project_id)
        .await
        .during("load project")?
        .ok_or(TenancyError::NotFound { entity: "project" })?;

    let tasks = store
        .list_tasks(org.org_id, project.id)
        .await
        .during("list tasks")?;

    Ok(ProjectDetail { project, tasks })
}
