/// Audit recording and the activity feed
///
/// Audit is best-effort: the entry is appended after the primary write has
/// already succeeded, and a failed append is logged at `error` level but
/// never fails or undoes the operation that triggered it. The trail can
/// therefore miss entries when the store hiccups; it never contains entries
/// for writes that did not happen.

use tracing::{debug, error};

use crate::auth::RequestContext;
use crate::error::{StoreContext, TenancyResult};
use crate::models::audit_log::{AuditEntry, AuditLog};
use crate::store::TenancyStore;

/// Entries returned when the caller does not ask for a limit
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page the activity feed returns
pub const MAX_LIMIT: i64 = 100;

/// Appends `entry`, logging instead of failing
///
/// Returns the stored row when the append succeeded.
pub async fn record(store: &dyn TenancyStore, entry: AuditEntry) -> Option<AuditLog> {
    let org_id = entry.org_id;
    let action = entry.action.clone();

    match store.log_action(entry).await {
        Ok(log) => {
            debug!(org_id = %org_id, action = %action, audit_id = %log.id, "Audit entry recorded");
            Some(log)
        }
        Err(e) => {
            error!(org_id = %org_id, action = %action, error = %e, "Failed to record audit entry");
            None
        }
    }
}

/// Newest audit entries of the caller's organization
///
/// `limit` defaults to [`DEFAULT_LIMIT`] and is clamped to `1..=MAX_LIMIT`.
pub async fn list_recent(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
    limit: Option<i64>,
) -> TenancyResult<Vec<AuditLog>> {
    let (_, org) = ctx.require_member()?;
    let limit = clamp_limit(limit);

    store
        .list_audit_logs(org.org_id, limit)
        .await
        .during("list activity")
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
