/// In-memory implementation of [`TenancyStore`]
///
/// All tables live behind one mutex, so every trait method is a single
/// critical section. That gives the same guarantees the Postgres schema
/// gives: unique `(org_id, user_id)` and `user_id` on memberships, unique
/// invite tokens, the task/project org foreign key, and an atomic invite
/// redemption. The lock is never held across an `.await`.
///
/// Rows are kept in insertion order; "newest first" listings walk the
/// tables backwards.
///
/// # Failure injection
///
/// [`MemoryStore::fail_on`] makes one operation report
/// `StoreError::Unavailable` until [`MemoryStore::clear_failures`] is called.
///
/// ```
/// use orgdesk_shared::store::{MemoryStore, StoreOp, TenancyStore};
/// use uuid::Uuid;
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// store.fail_on(StoreOp::FindMembership);
/// assert!(store.find_membership_by_user(Uuid::new_v4()).await.is_err());
/// # }
/// ```

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::TenancyStore;
use crate::auth::Principal;
use crate::error::{StoreError, StoreResult};
use crate::models::audit_log::{AuditEntry, AuditLog};
use crate::models::invite::{self, CreateInvite, Invite};
use crate::models::membership::{self, CreateMembership, Membership, MembershipRole};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::project::{CreateProject, Project, ProjectSummary};
use crate::models::task::{CreateTask, Task, TaskScope};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindMembership,
    ListMemberships,
    InsertMembership,
    InsertOrganization,
    DeleteOrganization,
    InsertInvite,
    FindInvite,
    RedeemInvite,
    ListInvites,
    InsertProject,
    FindProject,
    ListProjects,
    InsertTask,
    UpdateTask,
    DeleteTask,
    ListTasks,
    LogAction,
    ListAuditLogs,
    Ping,
}

#[derive(Debug, Default)]
struct Tables {
    organizations: Vec<Organization>,
    memberships: Vec<Membership>,
    invites: Vec<Invite>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    audit_logs: Vec<AuditLog>,
}

impl Tables {
    fn organization_exists(&self, org_id: Uuid) -> bool {
        self.organizations.iter().any(|o| o.id == org_id)
    }

    fn check_membership_unique(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        if self
            .memberships
            .iter()
            .any(|m| m.org_id == org_id && m.user_id == user_id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: membership::ORG_USER_CONSTRAINT.to_string(),
            });
        }
        if self.memberships.iter().any(|m| m.user_id == user_id) {
            return Err(StoreError::UniqueViolation {
                constraint: membership::USER_CONSTRAINT.to_string(),
            });
        }
        Ok(())
    }

    fn require_organization(&self, org_id: Uuid, constraint: &str) -> StoreResult<()> {
        if self.organization_exists(org_id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation {
                constraint: constraint.to_string(),
            })
        }
    }
}

/// Tenancy store kept entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    failures: Arc<Mutex<HashSet<StoreOp>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `op` fail with `StoreError::Unavailable` until cleared
    pub fn fail_on(&self, op: StoreOp) {
        lock(&self.failures).insert(op);
    }

    /// Removes all injected failures
    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Number of organizations currently stored
    pub fn organization_count(&self) -> usize {
        lock(&self.tables).organizations.len()
    }

    /// Number of memberships currently stored
    pub fn membership_count(&self) -> usize {
        lock(&self.tables).memberships.len()
    }

    /// Number of projects currently stored, across all organizations
    pub fn project_count(&self) -> usize {
        lock(&self.tables).projects.len()
    }

    /// Number of audit rows currently stored, across all organizations
    pub fn audit_log_count(&self) -> usize {
        lock(&self.tables).audit_logs.len()
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        if lock(&self.failures).contains(&op) {
            return Err(StoreError::Unavailable(format!("injected failure on {:?}", op)));
        }
        Ok(())
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        lock(&self.tables)
    }
}

/// Locks a mutex, recovering the data if a panicking holder poisoned it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TenancyStore for MemoryStore {
    fn scoped_to(&self, _principal: &Principal) -> Arc<dyn TenancyStore> {
        Arc::new(self.clone())
    }

    async fn find_membership_by_user(&self, user_id: Uuid) -> StoreResult<Option<Membership>> {
        self.check(StoreOp::FindMembership)?;
        let tables = self.tables();
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned())
    }

    async fn list_memberships(&self, org_id: Uuid) -> StoreResult<Vec<Membership>> {
        self.check(StoreOp::ListMemberships)?;
        let tables = self.tables();
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn insert_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        self.check(StoreOp::InsertMembership)?;
        let mut tables = self.tables();

        tables.require_organization(data.org_id, "memberships_org_id_fkey")?;
        tables.check_membership_unique(data.org_id, data.user_id)?;

        let membership = Membership {
            id: Uuid::new_v4(),
            org_id: data.org_id,
            user_id: data.user_id,
            role: data.role,
            created_at: Utc::now(),
        };
        tables.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn insert_organization(&self, data: CreateOrganization) -> StoreResult<Organization> {
        self.check(StoreOp::InsertOrganization)?;
        let org = Organization {
            id: Uuid::new_v4(),
            name: data.name,
            created_at: Utc::now(),
        };
        self.tables().organizations.push(org.clone());
        Ok(org)
    }

    async fn delete_organization(&self, org_id: Uuid) -> StoreResult<bool> {
        self.check(StoreOp::DeleteOrganization)?;
        let mut tables = self.tables();

        // The append-only trigger fires on cascaded deletes too.
        if tables.audit_logs.iter().any(|a| a.org_id == org_id) {
            return Err(StoreError::Database("audit_logs is append-only".to_string()));
        }

        let before = tables.organizations.len();
        tables.organizations.retain(|o| o.id != org_id);
        let removed = tables.organizations.len() < before;

        if removed {
            // ON DELETE CASCADE
            tables.memberships.retain(|m| m.org_id != org_id);
            tables.invites.retain(|i| i.org_id != org_id);
            tables.projects.retain(|p| p.org_id != org_id);
            tables.tasks.retain(|t| t.org_id != org_id);
        }

        Ok(removed)
    }

    async fn insert_invite(&self, data: CreateInvite) -> StoreResult<Invite> {
        self.check(StoreOp::InsertInvite)?;
        let mut tables = self.tables();

        tables.require_organization(data.org_id, "invites_org_id_fkey")?;
        if tables.invites.iter().any(|i| i.token == data.token) {
            return Err(StoreError::UniqueViolation {
                constraint: invite::TOKEN_CONSTRAINT.to_string(),
            });
        }

        let invite = Invite {
            id: Uuid::new_v4(),
            org_id: data.org_id,
            email: data.email,
            invited_by: data.invited_by,
            token: data.token,
            accepted: false,
            created_at: Utc::now(),
        };
        tables.invites.push(invite.clone());
        Ok(invite)
    }

    async fn find_invite(&self, token: &str, email: &str) -> StoreResult<Option<Invite>> {
        self.check(StoreOp::FindInvite)?;
        let tables = self.tables();
        Ok(tables
            .invites
            .iter()
            .find(|i| i.token == token && i.email == email)
            .cloned())
    }

    async fn redeem_invite(&self, invite_id: Uuid, user_id: Uuid) -> StoreResult<Membership> {
        self.check(StoreOp::RedeemInvite)?;
        let mut tables = self.tables();

        let (index, org_id) = tables
            .invites
            .iter()
            .enumerate()
            .find(|(_, i)| i.id == invite_id && !i.accepted)
            .map(|(index, i)| (index, i.org_id))
            .ok_or(StoreError::InviteAlreadyAccepted)?;

        // Validate the insert before flipping the flag so a failure leaves
        // the invite untouched, like a rolled back transaction.
        tables.check_membership_unique(org_id, user_id)?;

        tables.invites[index].accepted = true;

        let membership = Membership {
            id: Uuid::new_v4(),
            org_id,
            user_id,
            role: MembershipRole::Member,
            created_at: Utc::now(),
        };
        tables.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn list_pending_invites(&self, org_id: Uuid) -> StoreResult<Vec<Invite>> {
        self.check(StoreOp::ListInvites)?;
        let tables = self.tables();
        Ok(tables
            .invites
            .iter()
            .rev()
            .filter(|i| i.org_id == org_id && !i.accepted)
            .cloned()
            .collect())
    }

    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project> {
        self.check(StoreOp::InsertProject)?;
        let mut tables = self.tables();

        tables.require_organization(data.org_id, "projects_org_id_fkey")?;

        let project = Project {
            id: Uuid::new_v4(),
            org_id: data.org_id,
            name: data.name,
            created_at: Utc::now(),
        };
        tables.projects.push(project.clone());
        Ok(project)
    }

    async fn find_project(&self, org_id: Uuid, project_id: Uuid) -> StoreResult<Option<Project>> {
        self.check(StoreOp::FindProject)?;
        let tables = self.tables();
        Ok(tables
            .projects
            .iter()
            .find(|p| p.id == project_id && p.org_id == org_id)
            .cloned())
    }

    async fn list_projects(&self, org_id: Uuid) -> StoreResult<Vec<ProjectSummary>> {
        self.check(StoreOp::ListProjects)?;
        let tables = self.tables();
        Ok(tables
            .projects
            .iter()
            .rev()
            .filter(|p| p.org_id == org_id)
            .map(|p| ProjectSummary {
                id: p.id,
                org_id: p.org_id,
                name: p.name.clone(),
                created_at: p.created_at,
                task_count: tables
                    .tasks
                    .iter()
                    .filter(|t| t.project_id == p.id && t.org_id == p.org_id)
                    .count() as i64,
            })
            .collect())
    }

    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.check(StoreOp::InsertTask)?;
        let mut tables = self.tables();

        let parent_matches = tables
            .projects
            .iter()
            .any(|p| p.id == data.project_id && p.org_id == data.org_id);
        if !parent_matches {
            return Err(StoreError::ForeignKeyViolation {
                constraint: "tasks_project_org_fkey".to_string(),
            });
        }

        let task = Task {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            org_id: data.org_id,
            title: data.title,
            completed: false,
            created_at: Utc::now(),
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn set_task_completed(&self, scope: TaskScope, completed: bool) -> StoreResult<Option<Task>> {
        self.check(StoreOp::UpdateTask)?;
        let mut tables = self.tables();
        Ok(tables
            .tasks
            .iter_mut()
            .find(|t| {
                t.id == scope.task_id && t.project_id == scope.project_id && t.org_id == scope.org_id
            })
            .map(|t| {
                t.completed = completed;
                t.clone()
            }))
    }

    async fn delete_task(&self, scope: TaskScope) -> StoreResult<Option<Task>> {
        self.check(StoreOp::DeleteTask)?;
        let mut tables = self.tables();
        let position = tables.tasks.iter().position(|t| {
            t.id == scope.task_id && t.project_id == scope.project_id && t.org_id == scope.org_id
        });
        Ok(position.map(|index| tables.tasks.remove(index)))
    }

    async fn list_tasks(&self, org_id: Uuid, project_id: Uuid) -> StoreResult<Vec<Task>> {
        self.check(StoreOp::ListTasks)?;
        let tables = self.tables();
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| t.org_id == org_id && t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn log_action(&self, entry: AuditEntry) -> StoreResult<AuditLog> {
        self.check(StoreOp::LogAction)?;
        let mut tables = self.tables();

        tables.require_organization(entry.org_id, "audit_logs_org_id_fkey")?;

        let log = AuditLog {
            id: Uuid::new_v4(),
            org_id: entry.org_id,
            user_id: entry.user_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            metadata: entry.metadata,
            created_at: Utc::now(),
        };
        tables.audit_logs.push(log.clone());
        Ok(log)
    }

    async fn list_audit_logs(&self, org_id: Uuid, limit: i64) -> StoreResult<Vec<AuditLog>> {
        self.check(StoreOp::ListAuditLogs)?;
        let tables = self.tables();
        Ok(tables
            .audit_logs
            .iter()
            .rev()
            .filter(|a| a.org_id == org_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check(StoreOp::Ping)
    }
}
