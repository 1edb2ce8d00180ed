/// Organization model and database operations
///
/// Organizations are the tenant boundary. Projects, tasks, invites and audit
/// entries all carry an `org_id` that references this table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Organizations are never deleted by normal operation. [`Organization::delete`]
/// exists only to remove an organization left without an owner when
/// onboarding fails half way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Maximum organization name length (characters)
pub const MAX_NAME_LENGTH: usize = 100;

/// Organization (tenant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Display name, already trimmed
    pub name: String,

    /// When the organization was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// Organization name (trimmed, 1-100 characters)
    pub name: String,
}

impl Organization {
    /// Creates a new organization
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use orgdesk_shared::models::organization::{Organization, CreateOrganization};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let org = Organization::create(&pool, CreateOrganization {
    ///     name: "Acme".to_string(),
    /// }).await?;
    /// println!("Created organization: {}", org.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateOrganization,
    ) -> Result<Self, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&data.name)
        .fetch_one(executor)
        .await?;

        Ok(org)
    }

    /// Deletes an organization
    ///
    /// Returns true if a row was removed.
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
