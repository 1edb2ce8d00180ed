/// Audit log model and database operations
///
/// The audit log is append-only: rows are written exclusively through the
/// `log_action` stored procedure and a trigger rejects UPDATE and DELETE.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audit_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     user_id UUID,
///     action VARCHAR(100) NOT NULL,
///     entity_type VARCHAR(50),
///     entity_id UUID,
///     metadata JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Ordering by `created_at` is not a linearization of the underlying writes;
/// two concurrent actions may be appended in either order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgExecutor;
use uuid::Uuid;

/// Stable action identifiers
pub mod actions {
    pub const ORGANIZATION_CREATED: &str = "organization.created";
    pub const MEMBER_INVITED: &str = "member.invited";
    pub const MEMBER_JOINED: &str = "member.joined";
    pub const PROJECT_CREATED: &str = "project.created";
    pub const TASK_CREATED: &str = "task.created";
    pub const TASK_TOGGLED: &str = "task.toggled";
    pub const TASK_DELETED: &str = "task.deleted";
}

/// Entity type identifiers
pub mod entities {
    pub const ORGANIZATION: &str = "organization";
    pub const MEMBERSHIP: &str = "membership";
    pub const INVITE: &str = "invite";
    pub const PROJECT: &str = "project";
    pub const TASK: &str = "task";
}

/// Audit log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: Uuid,

    /// Organization the action happened in
    pub org_id: Uuid,

    /// Acting user; `None` only for system-originated actions
    pub user_id: Option<Uuid>,

    /// Action identifier, e.g. `project.created`
    pub action: String,

    pub entity_type: Option<String>,

    pub entity_id: Option<Uuid>,

    /// Free-form JSON object
    pub metadata: JsonValue,

    pub created_at: DateTime<Utc>,
}

/// An audit entry waiting to be appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub org_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub metadata: JsonValue,
}

impl AuditEntry {
    /// Starts an entry for an action performed by a user
    pub fn new(org_id: Uuid, user_id: Option<Uuid>, action: &str) -> Self {
        Self {
            org_id,
            user_id,
            action: action.to_string(),
            entity_type: None,
            entity_id: None,
            metadata: JsonValue::Object(Default::default()),
        }
    }

    /// Sets the entity the action touched
    pub fn entity(mut self, entity_type: &str, entity_id: Uuid) -> Self {
        self.entity_type = Some(entity_type.to_string());
        self.entity_id = Some(entity_id);
        self
    }

    /// Replaces the metadata object
    pub fn metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

impl AuditLog {
    /// Appends an entry through the `log_action` stored procedure
    pub async fn append<'e, E: PgExecutor<'e>>(
        executor: E,
        entry: AuditEntry,
    ) -> Result<Self, sqlx::Error> {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, org_id, user_id, action, entity_type, entity_id, metadata, created_at
            FROM log_action($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.org_id)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.metadata)
        .fetch_one(executor)
        .await?;

        Ok(log)
    }

    /// Lists the newest entries of an organization
    pub async fn list_recent<'e, E: PgExecutor<'e>>(
        executor: E,
        org_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, org_id, user_id, action, entity_type, entity_id, metadata, created_at
            FROM audit_logs
            WHERE org_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(org_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(logs)
    }
}
