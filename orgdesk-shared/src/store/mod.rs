/// Tenancy Store
///
/// Persistence boundary for organizations, memberships, invites, projects,
/// tasks and audit rows. Services only talk to the datastore through the
/// [`TenancyStore`] trait, which is object safe so the API can hold an
/// `Arc<dyn TenancyStore>`.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: sqlx/Postgres, schema in `migrations/`
/// - [`memory::MemoryStore`]: in-process tables enforcing the same unique
///   and scoping rules, with failure injection for exercising error paths
///
/// # Contract
///
/// - Reads and writes of tenant-owned rows take the `org_id` they are scoped to.
/// - [`TenancyStore::redeem_invite`] is atomic: the `accepted` flip and the
///   membership insert either both happen or neither does.
/// - [`TenancyStore::log_action`] is a plain append.
/// - Request handling goes through [`TenancyStore::scoped_to`], so the
///   datastore can enforce tenant boundaries on its own as well.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::StoreResult;
use crate::models::audit_log::{AuditEntry, AuditLog};
use crate::models::invite::{CreateInvite, Invite};
use crate::models::membership::{CreateMembership, Membership};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::project::{CreateProject, Project, ProjectSummary};
use crate::models::task::{CreateTask, Task, TaskScope};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryStore, StoreOp};
pub use postgres::PgStore;

/// Datastore operations used by the tenancy core
#[async_trait]
pub trait TenancyStore: Send + Sync + 'static {
    /// Handle whose operations run on behalf of `principal`
    ///
    /// The Postgres store sets the row-level security session settings from
    /// it. The memory store returns a handle onto the same tables.
    fn scoped_to(&self, principal: &Principal) -> Arc<dyn TenancyStore>;

    // Memberships

    /// Looks up the (single) membership held by a user
    async fn find_membership_by_user(&self, user_id: Uuid) -> StoreResult<Option<Membership>>;

    async fn list_memberships(&self, org_id: Uuid) -> StoreResult<Vec<Membership>>;

    async fn insert_membership(&self, data: CreateMembership) -> StoreResult<Membership>;

    // Organizations

    async fn insert_organization(&self, data: CreateOrganization) -> StoreResult<Organization>;

    /// Removes an organization; only used to compensate a failed onboarding
    async fn delete_organization(&self, org_id: Uuid) -> StoreResult<bool>;

    // Invites

    async fn insert_invite(&self, data: CreateInvite) -> StoreResult<Invite>;

    /// Finds an invite by token AND invitee email
    async fn find_invite(&self, token: &str, email: &str) -> StoreResult<Option<Invite>>;

    /// Flips `accepted` false -> true and inserts a member-role membership
    ///
    /// Fails with `InviteAlreadyAccepted` if the conditional update matched
    /// nothing and with `UniqueViolation` if the user already has a
    /// membership. Nothing is written in either case.
    async fn redeem_invite(&self, invite_id: Uuid, user_id: Uuid) -> StoreResult<Membership>;

    async fn list_pending_invites(&self, org_id: Uuid) -> StoreResult<Vec<Invite>>;

    // Projects

    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project>;

    async fn find_project(&self, org_id: Uuid, project_id: Uuid) -> StoreResult<Option<Project>>;

    async fn list_projects(&self, org_id: Uuid) -> StoreResult<Vec<ProjectSummary>>;

    // Tasks

    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn set_task_completed(&self, scope: TaskScope, completed: bool) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, scope: TaskScope) -> StoreResult<Option<Task>>;

    async fn list_tasks(&self, org_id: Uuid, project_id: Uuid) -> StoreResult<Vec<Task>>;

    // Audit

    /// Appends one audit row (the `log_action` procedure)
    async fn log_action(&self, entry: AuditEntry) -> StoreResult<AuditLog>;

    async fn list_audit_logs(&self, org_id: Uuid, limit: i64) -> StoreResult<Vec<AuditLog>>;

    // Health

    /// Cheap connectivity check
    async fn ping(&self) -> StoreResult<()>;
}
