/// Postgres implementation of [`TenancyStore`]
///
/// Every operation runs in its own transaction. A handle scoped to a
/// principal (see [`TenancyStore::scoped_to`]) first sets the transaction
/// local `app.user_id` and `app.email` settings that the row-level security
/// policies in `migrations/` key on. Invite redemption runs the conditional
/// `accepted` update and the membership insert in that same transaction.
///
/// # Example
///
/// ```no_run
/// use orgdesk_shared::auth::Principal;
/// use orgdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use orgdesk_shared::store::{PgStore, TenancyStore};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// }).await?;
///
/// let store = PgStore::new(pool);
/// store.ping().await?;
///
/// let ada = Principal::new(Uuid::new_v4(), "ada@example.com");
/// let as_ada = store.with_principal(&ada);
/// let membership = as_ada.find_membership_by_user(ada.user_id).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::TenancyStore;
use crate::auth::Principal;
use crate::db::pool::health_check;
use crate::error::{StoreError, StoreResult};
use crate::models::audit_log::{AuditEntry, AuditLog};
use crate::models::invite::{CreateInvite, Invite};
use crate::models::membership::{CreateMembership, Membership, MembershipRole};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::project::{CreateProject, Project, ProjectSummary};
use crate::models::task::{CreateTask, Task, TaskScope};

/// Tenancy store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,

    /// Identity written to the session settings of each transaction
    session: Option<Principal>,
}

impl PgStore {
    /// Wraps an existing pool; transactions carry no identity
    pub fn new(pool: PgPool) -> Self {
        Self { pool, session: None }
    }

    /// Handle on the same pool whose transactions run as `principal`
    pub fn with_principal(&self, principal: &Principal) -> Self {
        Self {
            pool: self.pool.clone(),
            session: Some(principal.clone()),
        }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;

        if let Some(principal) = &self.session {
            sqlx::query("SELECT set_config('app.user_id', $1, true), set_config('app.email', $2, true)")
                .bind(principal.user_id.to_string())
                .bind(&principal.email)
                .execute(&mut *tx)
                .await?;
        }

        Ok(tx)
    }
}

#[async_trait]
impl TenancyStore for PgStore {
    fn scoped_to(&self, principal: &Principal) -> Arc<dyn TenancyStore> {
        Arc::new(self.with_principal(principal))
    }

    async fn find_membership_by_user(&self, user_id: Uuid) -> StoreResult<Option<Membership>> {
        let mut tx = self.begin().await?;
        let membership = Membership::find_by_user(&mut *tx, user_id).await?;
        tx.commit().await?;
        Ok(membership)
    }

    async fn list_memberships(&self, org_id: Uuid) -> StoreResult<Vec<Membership>> {
        let mut tx = self.begin().await?;
        let memberships = Membership::list_by_org(&mut *tx, org_id).await?;
        tx.commit().await?;
        Ok(memberships)
    }

    async fn insert_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        let mut tx = self.begin().await?;
        let membership = Membership::create(&mut *tx, data).await?;
        tx.commit().await?;
        Ok(membership)
    }

    async fn insert_organization(&self, data: CreateOrganization) -> StoreResult<Organization> {
        let mut tx = self.begin().await?;
        let org = Organization::create(&mut *tx, data).await?;
        tx.commit().await?;
        Ok(org)
    }

    async fn delete_organization(&self, org_id: Uuid) -> StoreResult<bool> {
        let mut tx = self.begin().await?;
        let removed = Organization::delete(&mut *tx, org_id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn insert_invite(&self, data: CreateInvite) -> StoreResult<Invite> {
        let mut tx = self.begin().await?;
        let invite = Invite::create(&mut *tx, data).await?;
        tx.commit().await?;
        Ok(invite)
    }

    async fn find_invite(&self, token: &str, email: &str) -> StoreResult<Option<Invite>> {
        let mut tx = self.begin().await?;
        let invite = Invite::find_by_token_and_email(&mut *tx, token, email).await?;
        tx.commit().await?;
        Ok(invite)
    }

    async fn redeem_invite(&self, invite_id: Uuid, user_id: Uuid) -> StoreResult<Membership> {
        let mut tx = self.begin().await?;

        // Row lock on the invite serializes racing redemptions; the loser
        // sees accepted = TRUE and matches nothing.
        let invite = Invite::mark_accepted(&mut *tx, invite_id)
            .await?
            .ok_or(StoreError::InviteAlreadyAccepted)?;

        let membership = Membership::create(
            &mut *tx,
            CreateMembership {
                org_id: invite.org_id,
                user_id,
                role: MembershipRole::Member,
            },
        )
        .await?;

        tx.commit().await?;

        debug!(invite_id = %invite_id, org_id = %invite.org_id, "Invite redeemed");
        Ok(membership)
    }

    async fn list_pending_invites(&self, org_id: Uuid) -> StoreResult<Vec<Invite>> {
        let mut tx = self.begin().await?;
        let invites = Invite::list_pending(&mut *tx, org_id).await?;
        tx.commit().await?;
        Ok(invites)
    }

    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project> {
        let mut tx = self.begin().await?;
        let project = Project::create(&mut *tx, data).await?;
        tx.commit().await?;
        Ok(project)
    }

    async fn find_project(&self, org_id: Uuid, project_id: Uuid) -> StoreResult<Option<Project>> {
        let mut tx = self.begin().await?;
        let project = Project::find_in_org(&mut *tx, org_id, project_id).await?;
        tx.commit().await?;
        Ok(project)
    }

    async fn list_projects(&self, org_id: Uuid) -> StoreResult<Vec<ProjectSummary>> {
        let mut tx = self.begin().await?;
        let projects = Project::list_with_task_counts(&mut *tx, org_id).await?;
        tx.commit().await?;
        Ok(projects)
    }

    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut tx = self.begin().await?;
        let task = Task::create(&mut *tx, data).await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn set_task_completed(&self, scope: TaskScope, completed: bool) -> StoreResult<Option<Task>> {
        let mut tx = self.begin().await?;
        let task = Task::set_completed(&mut *tx, scope, completed).await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn delete_task(&self, scope: TaskScope) -> StoreResult<Option<Task>> {
        let mut tx = self.begin().await?;
        let task = Task::delete(&mut *tx, scope).await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn list_tasks(&self, org_id: Uuid, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let mut tx = self.begin().await?;
        let tasks = Task::list_by_project(&mut *tx, org_id, project_id).await?;
        tx.commit().await?;
        Ok(tasks)
    }

    async fn log_action(&self, entry: AuditEntry) -> StoreResult<AuditLog> {
        let mut tx = self.begin().await?;
        let log = AuditLog::append(&mut *tx, entry).await?;
        tx.commit().await?;
        Ok(log)
    }

    async fn list_audit_logs(&self, org_id: Uuid, limit: i64) -> StoreResult<Vec<AuditLog>> {
        let mut tx = self.begin().await?;
        let logs = AuditLog::list_recent(&mut *tx, org_id, limit).await?;
        tx.commit().await?;
        Ok(logs)
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await.map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
