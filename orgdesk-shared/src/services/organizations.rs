/// Organization onboarding and member listing
///
/// Creating an organization is two writes, the organization row and the
/// creator's owner membership, which the store does not run atomically. If
/// the second write fails the organization is deleted again and the caller
/// gets [`TenancyError::PartialFailure`], which says whether that cleanup
/// worked. An organization without an owner is never reported as success.

use serde_json::json;
use tracing::{error, info, warn};

use super::{audit, required_text};
use crate::auth::RequestContext;
use crate::error::{StoreContext, TenancyError, TenancyResult};
use crate::models::audit_log::{actions, entities, AuditEntry};
use crate::models::membership::{CreateMembership, Membership, MembershipRole, USER_CONSTRAINT};
use crate::models::organization::{CreateOrganization, Organization, MAX_NAME_LENGTH};
use crate::store::TenancyStore;

/// Creates an organization owned by the caller
///
/// # Errors
///
/// - `Unauthenticated` without a principal
/// - `InvalidInput` for a blank or overlong name
/// - `DuplicateMembership` if the caller already belongs to an organization,
///   including one created by a concurrent call
/// - `StoreUnavailable` if the organization insert fails
/// - `PartialFailure` if the organization was inserted but the owner
///   membership was not
pub async fn create_organization(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
    raw_name: &str,
) -> TenancyResult<Organization> {
    let principal = ctx.require_principal()?;
    let name = required_text("name", raw_name, MAX_NAME_LENGTH)?;

    if ctx.has_organization() {
        return Err(TenancyError::DuplicateMembership);
    }

    let org = store
        .insert_organization(CreateOrganization { name })
        .await
        .during("create organization")?;

    let membership = store
        .insert_membership(CreateMembership {
            org_id: org.id,
            user_id: principal.user_id,
            role: MembershipRole::Owner,
        })
        .await;

    if let Err(e) = membership {
        warn!(
            org_id = %org.id,
            user_id = %principal.user_id,
            error = %e,
            "Owner membership insert failed, removing organization"
        );

        let orphan_removed = match store.delete_organization(org.id).await {
            Ok(removed) => removed,
            Err(cleanup) => {
                error!(org_id = %org.id, error = %cleanup, "Failed to remove orphaned organization");
                false
            }
        };

        // A concurrent onboarding of the same user won the race
        if orphan_removed && e.is_unique_violation(USER_CONSTRAINT) {
            return Err(TenancyError::DuplicateMembership);
        }

        return Err(TenancyError::PartialFailure {
            org_id: org.id,
            orphan_removed,
            reason: e.to_string(),
        });
    }

    audit::record(
        store,
        AuditEntry::new(org.id, Some(principal.user_id), actions::ORGANIZATION_CREATED)
            .entity(entities::ORGANIZATION, org.id)
            .metadata(json!({ "name": org.name })),
    )
    .await;

    info!(org_id = %org.id, user_id = %principal.user_id, "Organization created");
    Ok(org)
}

/// Members of the caller's organization, oldest first
pub async fn list_members(store: &dyn TenancyStore, ctx: &RequestContext) -> TenancyResult<Vec<Membership>> {
    let (_, org) = ctx.require_member()?;

    store.list_memberships(org.org_id).await.during("list members")
}
