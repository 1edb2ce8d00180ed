/// Tasks
///
/// A task's `org_id` is copied from its project at creation, never taken from
/// the caller. Toggle and delete match on task, project and organization
/// together, so a task id from another tenant or another project is
/// `NotFound`.

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::{audit, required_text};
use crate::auth::RequestContext;
use crate::error::{StoreContext, StoreError, TenancyError, TenancyResult};
use crate::models::audit_log::{actions, entities, AuditEntry};
use crate::models::task::{CreateTask, Task, TaskScope, MAX_TITLE_LENGTH};
use crate::store::TenancyStore;

/// Adds a task to a project of the caller's organization
pub async fn create_task(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
    project_id: Uuid,
    raw_title: &str,
) -> TenancyResult<Task> {
    let (principal, org) = ctx.require_member()?;
    let title = required_text("title", raw_title, MAX_TITLE_LENGTH)?;

    let project = store
        .find_project(org.org_id, project_id)
        .await
        .during("load project")?
        .ok_or(TenancyError::NotFound { entity: "project" })?;

    let task = store
        .insert_task(CreateTask {
            project_id: project.id,
            org_id: project.org_id,
            title,
        })
        .await
        .map_err(|e| match e {
            // project deleted in between
            StoreError::ForeignKeyViolation { .. } => TenancyError::NotFound { entity: "project" },
            source => TenancyError::store("create task", source),
        })?;

    audit::record(
        store,
        AuditEntry::new(org.org_id, Some(principal.user_id), actions::TASK_CREATED)
            .entity(entities::TASK, task.id)
            .metadata(json!({ "project_id": project.id, "title": task.title })),
    )
    .await;

    info!(org_id = %org.org_id, project_id = %project.id, task_id = %task.id, "Task created");
    Ok(task)
}

/// Sets a task's completion flag
pub async fn toggle_task(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
    task_id: Uuid,
    project_id: Uuid,
    completed: bool,
) -> TenancyResult<Task> {
    let (principal, org) = ctx.require_member()?;
    let scope = TaskScope {
        org_id: org.org_id,
        project_id,
        task_id,
    };

    let task = store
        .set_task_completed(scope, completed)
        .await
        .during("update task")?
        .ok_or(TenancyError::NotFound { entity: "task" })?;

    audit::record(
        store,
        AuditEntry::new(org.org_id, Some(principal.user_id), actions::TASK_TOGGLED)
            .entity(entities::TASK, task.id)
            .metadata(json!({ "completed": completed, "project_id": project_id })),
    )
    .await;

    info!(org_id = %org.org_id, task_id = %task.id, completed, "Task toggled");
    Ok(task)
}

/// Deletes a task
pub async fn delete_task(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
    task_id: Uuid,
    project_id: Uuid,
) -> TenancyResult<()> {
    let (principal, org) = ctx.require_member()?;
    let scope = TaskScope {
        org_id: org.org_id,
        project_id,
        task_id,
    };

    let task = store
        .delete_task(scope)
        .await
        .during("delete task")?
        .ok_or(TenancyError::NotFound { entity: "task" })?;

    audit::record(
        store,
        AuditEntry::new(org.org_id, Some(principal.user_id), actions::TASK_DELETED)
            .entity(entities::TASK, task.id)
            .metadata(json!({ "project_id": project_id, "title": task.title })),
    )
    .await;

    info!(org_id = %org.org_id, task_id = %task.id, "Task deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::services::organizations::create_organization;
    use crate::services::projects::{create_project, get_project};
    use crate::store::MemoryStore;

    async fn member_ctx(store: &MemoryStore) -> RequestContext {
        let principal = Principal::new(Uuid::new_v4(), "a@x.com");
        let ctx = RequestContext::resolve(store, Some(principal.clone())).await.unwrap();
        create_organization(store, &ctx, "Acme").await.unwrap();
        RequestContext::resolve(store, Some(principal)).await.unwrap()
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let store = MemoryStore::new();
        let ctx = member_ctx(&store).await;
        let project = create_project(&store, &ctx, "Launch").await.unwrap();

        let task = create_task(&store, &ctx, project.id, " Write docs ").await.unwrap();
        assert_eq!(task.title, "Write docs");
        assert_eq!(task.org_id, project.org_id);
        assert!(!task.completed);

        let toggled = toggle_task(&store, &ctx, task.id, project.id, true).await.unwrap();
        assert!(toggled.completed);

        delete_task(&store, &ctx, task.id, project.id).await.unwrap();
        assert!(get_project(&store, &ctx, project.id).await.unwrap().tasks.is_empty());

        let err = delete_task(&store, &ctx, task.id, project.id).await.unwrap_err();
        assert!(matches!(err, TenancyError::NotFound { entity: "task" }));
    }

    #[tokio::test]
    async fn test_task_in_wrong_project_is_not_found() {
        let store = MemoryStore::new();
        let ctx = member_ctx(&store).await;
        let first = create_project(&store, &ctx, "First").await.unwrap();
        let second = create_project(&store, &ctx, "Second").await.unwrap();
        let task = create_task(&store, &ctx, first.id, "Ship").await.unwrap();

        let err = toggle_task(&store, &ctx, task.id, second.id, true).await.unwrap_err();
        assert!(matches!(err, TenancyError::NotFound { entity: "task" }));
    }

    #[tokio::test]
    async fn test_title_too_long() {
        let store = MemoryStore::new();
        let ctx = member_ctx(&store).await;
        let project = create_project(&store, &ctx, "Launch").await.unwrap();

        let err = create_task(&store, &ctx, project.id, &"x".repeat(MAX_TITLE_LENGTH + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TenancyError::InvalidInput { field: "title", .. }));
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let store = MemoryStore::new();
        let ctx = member_ctx(&store).await;

        let err = create_task(&store, &ctx, Uuid::new_v4(), "Ship").await.unwrap_err();
        assert!(matches!(err, TenancyError::NotFound { entity: "project" }));
    }
}
