/// Task model and database operations
///
/// Tasks belong to a project and carry a denormalized copy of the project's
/// `org_id` so tenant filters never need a join. A composite foreign key
/// `(project_id, org_id) -> projects(id, org_id)` keeps the copy honest.
///
/// Updates and deletes match on all three of `id`, `project_id` and
/// `org_id`; a task from another organization is simply not found.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL,
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tasks_project_org_fkey FOREIGN KEY (project_id, org_id)
///         REFERENCES projects (id, org_id) ON DELETE CASCADE
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use orgdesk_shared::models::task::{Task, CreateTask, TaskScope};
/// use orgdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(org_id: Uuid, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     project_id,
///     org_id,
///     title: "Write the launch post".to_string(),
/// }).await?;
///
/// let scope = TaskScope { org_id, project_id, task_id: task.id };
/// Task::set_completed(&pool, scope, true).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Maximum task title length (characters)
pub const MAX_TITLE_LENGTH: usize = 200;

/// Task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Task ID
    pub id: Uuid,

    /// Parent project
    pub project_id: Uuid,

    /// Always equal to the parent project's `org_id`
    pub org_id: Uuid,

    /// Task title
    pub title: String,

    /// Completion flag
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub org_id: Uuid,
    pub title: String,
}

/// Identifies one task inside one project inside one organization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskScope {
    pub org_id: Uuid,
    pub project_id: Uuid,
    pub task_id: Uuid,
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the project does not exist in
    /// `data.org_id`.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, org_id, title)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, org_id, title, completed, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.org_id)
        .bind(&data.title)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Sets the completion flag of a scoped task
    ///
    /// Returns `None` if no task matches the scope. Concurrent toggles are
    /// last-write-wins.
    pub async fn set_completed<'e, E: PgExecutor<'e>>(
        executor: E,
        scope: TaskScope,
        completed: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET completed = $4
            WHERE id = $1 AND project_id = $2 AND org_id = $3
            RETURNING id, project_id, org_id, title, completed, created_at
            "#,
        )
        .bind(scope.task_id)
        .bind(scope.project_id)
        .bind(scope.org_id)
        .bind(completed)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Deletes a scoped task, returning the removed row
    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        scope: TaskScope,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND project_id = $2 AND org_id = $3
            RETURNING id, project_id, org_id, title, completed, created_at
            "#,
        )
        .bind(scope.task_id)
        .bind(scope.project_id)
        .bind(scope.org_id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Lists the tasks of a project, newest first
    pub async fn list_by_project<'e, E: PgExecutor<'e>>(
        executor: E,
        org_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, org_id, title, completed, created_at
            FROM tasks
            WHERE org_id = $1 AND project_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(tasks)
    }
}
