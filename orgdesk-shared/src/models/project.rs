/// Project model and database operations
///
/// Every query here is scoped by `org_id`. A project id from another
/// organization behaves exactly like a project id that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT projects_id_org_key UNIQUE (id, org_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Maximum project name length (characters)
pub const MAX_NAME_LENGTH: usize = 100;

/// Project owned by exactly one organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Project row with its task count, as shown on the project list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,

    /// Number of tasks in the project
    pub task_count: i64,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub org_id: Uuid,
    pub name: String,
}

impl Project {
    /// Creates a new project
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (org_id, name)
            VALUES ($1, $2)
            RETURNING id, org_id, name, created_at
            "#,
        )
        .bind(data.org_id)
        .bind(&data.name)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    /// Finds a project inside an organization
    pub async fn find_in_org<'e, E: PgExecutor<'e>>(
        executor: E,
        org_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, org_id, name, created_at
            FROM projects
            WHERE id = $1 AND org_id = $2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Lists an organization's projects with task counts, newest first
    pub async fn list_with_task_counts<'e, E: PgExecutor<'e>>(
        executor: E,
        org_id: Uuid,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        let projects = sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT p.id, p.org_id, p.name, p.created_at, COUNT(t.id) AS task_count
            FROM projects p
            LEFT JOIN tasks t ON t.project_id = p.id AND t.org_id = p.org_id
            WHERE p.org_id = $1
            GROUP BY p.id
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }
}
