/// Invite model and database operations
///
/// An invite offers membership in an organization to one email address.
/// It is redeemed at most once: `accepted` only moves from false to true,
/// through a conditional update so that two racing redemptions cannot both
/// succeed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invites (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     email VARCHAR(255) NOT NULL,
///     invited_by UUID NOT NULL,
///     token VARCHAR(64) NOT NULL,
///     accepted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT invites_token_key UNIQUE (token)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Name of the token unique constraint
pub const TOKEN_CONSTRAINT: &str = "invites_token_key";

/// Maximum invitee email length
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Invite row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invite {
    /// Invite ID
    pub id: Uuid,

    /// Organization the invite grants access to
    pub org_id: Uuid,

    /// Invitee email, normalized to lowercase
    pub email: String,

    /// User who issued the invite
    pub invited_by: Uuid,

    /// Opaque single-use credential
    pub token: String,

    /// Whether the invite has been redeemed
    pub accepted: bool,

    /// When the invite was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new invite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvite {
    pub org_id: Uuid,
    pub email: String,
    pub invited_by: Uuid,
    pub token: String,
}

impl Invite {
    /// Inserts a new, unaccepted invite
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateInvite,
    ) -> Result<Self, sqlx::Error> {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            INSERT INTO invites (org_id, email, invited_by, token)
            VALUES ($1, $2, $3, $4)
            RETURNING id, org_id, email, invited_by, token, accepted, created_at
            "#,
        )
        .bind(data.org_id)
        .bind(&data.email)
        .bind(data.invited_by)
        .bind(&data.token)
        .fetch_one(executor)
        .await?;

        Ok(invite)
    }

    /// Finds an invite by token, restricted to the given email
    ///
    /// Matching on both columns means an intercepted token is useless to a
    /// different mailbox.
    pub async fn find_by_token_and_email<'e, E: PgExecutor<'e>>(
        executor: E,
        token: &str,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, org_id, email, invited_by, token, accepted, created_at
            FROM invites
            WHERE token = $1 AND email = $2
            "#,
        )
        .bind(token)
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(invite)
    }

    /// Marks an invite accepted if and only if it is still pending
    ///
    /// Returns `None` when the invite does not exist or another caller
    /// already flipped it.
    pub async fn mark_accepted<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            UPDATE invites
            SET accepted = TRUE
            WHERE id = $1 AND accepted = FALSE
            RETURNING id, org_id, email, invited_by, token, accepted, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(invite)
    }

    /// Lists pending invites of an organization, newest first
    pub async fn list_pending<'e, E: PgExecutor<'e>>(
        executor: E,
        org_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let invites = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, org_id, email, invited_by, token, accepted, created_at
            FROM invites
            WHERE org_id = $1 AND accepted = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(executor)
        .await?;

        Ok(invites)
    }
}
