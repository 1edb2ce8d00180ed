/// Membership model and database operations
///
/// A membership binds a user (owned by the external identity provider) to an
/// organization with a role. The Membership Resolver consults this table
/// before every mutation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('owner', 'member');
///
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL,
///     role membership_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT memberships_org_user_key UNIQUE (org_id, user_id)
/// );
///
/// CREATE UNIQUE INDEX memberships_user_key ON memberships (user_id);
/// ```
///
/// The second unique index enforces one organization per user.
///
/// # Roles
///
/// - **owner**: Everything a member can do, plus issuing invites
/// - **member**: Create, update and delete projects and tasks
///
/// # Example
///
/// ```no_run
/// use orgdesk_shared::models::membership::{Membership, CreateMembership, MembershipRole};
/// use orgdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let membership = Membership::create(&pool, CreateMembership {
///     org_id: Uuid::new_v4(),
///     user_id: Uuid::new_v4(),
///     role: MembershipRole::Member,
/// }).await?;
///
/// let resolved = Membership::find_by_user(&pool, membership.user_id).await?;
/// assert!(resolved.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use uuid::Uuid;

/// Name of the `(org_id, user_id)` unique constraint
pub const ORG_USER_CONSTRAINT: &str = "memberships_org_user_key";

/// Name of the one-organization-per-user unique index
pub const USER_CONSTRAINT: &str = "memberships_user_key";

/// Roles a user can hold inside an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Founding role, granted only when the organization is created
    Owner,

    /// Resource CRUD only
    Member,
}

impl MembershipRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Member => "member",
        }
    }

    /// Checks if this role has at least the permission level of `required`
    ///
    /// Hierarchy: Owner > Member
    pub fn has_permission(&self, required: &MembershipRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            MembershipRole::Owner => 2,
            MembershipRole::Member => 1,
        }
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership row linking a user to an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Membership ID
    pub id: Uuid,

    /// Organization ID
    pub org_id: Uuid,

    /// User ID from the identity provider
    pub user_id: Uuid,

    /// Role within the organization
    pub role: MembershipRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Organization ID
    pub org_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: MembershipRole,
}

fn default_role() -> MembershipRole {
    MembershipRole::Member
}

impl Membership {
    /// Creates a new membership
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user already has a membership (unique constraint violation)
    /// - The organization doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateMembership,
    ) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (org_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, org_id, user_id, role, created_at
            "#,
        )
        .bind(data.org_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await?;

        Ok(membership)
    }

    /// Finds the membership held by a user
    ///
    /// At most one row exists per user (see `memberships_user_key`).
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use orgdesk_shared::models::membership::Membership;
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    /// if let Some(membership) = Membership::find_by_user(&pool, user_id).await? {
    ///     println!("User role: {}", membership.role);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, org_id, user_id, role, created_at
            FROM memberships
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    /// Lists all members of an organization, oldest first
    pub async fn list_by_org<'e, E: PgExecutor<'e>>(
        executor: E,
        org_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, org_id, user_id, role, created_at
            FROM memberships
            WHERE org_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(executor)
        .await?;

        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_role_as_str() {
        assert_eq!(MembershipRole::Owner.as_str(), "owner");
        assert_eq!(MembershipRole::Member.as_str(), "member");
        assert_eq!(MembershipRole::Owner.to_string(), "owner");
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(MembershipRole::Owner.has_permission(&MembershipRole::Member));
        assert!(MembershipRole::Owner.has_permission(&MembershipRole::Owner));
        assert!(MembershipRole::Member.has_permission(&MembershipRole::Member));
        assert!(!MembershipRole::Member.has_permission(&MembershipRole::Owner));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&MembershipRole::Owner).unwrap();
        assert_eq!(json, "\"owner\"");
    }

    #[test]
    fn test_create_membership_default_role() {
        assert_eq!(default_role(), MembershipRole::Member);
    }
}
