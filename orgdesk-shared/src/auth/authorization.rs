/// Membership resolution and authorization gates
///
/// Every request resolves its [`RequestContext`] exactly once, before any
/// service runs, and the same value is threaded through every call made on
/// behalf of that request. Services never look membership up again, so
/// "does the caller have an organization" and "which organization" can't
/// disagree within a request.
///
/// # Permission Model
///
/// 1. **Authentication**: a [`Principal`] from the identity provider
/// 2. **Membership**: at most one organization per user
/// 3. **Role**: `owner` outranks `member`; invites require `owner`
///
/// # Example
///
/// ```
/// use orgdesk_shared::auth::authorization::RequestContext;
/// use orgdesk_shared::auth::identity::Principal;
/// use orgdesk_shared::models::membership::MembershipRole;
/// use orgdesk_shared::store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let principal = Principal::new(Uuid::new_v4(), "ada@example.com");
///
/// let ctx = RequestContext::resolve(&store, Some(principal)).await?;
/// assert!(!ctx.has_organization());
/// assert!(ctx.require_role(MembershipRole::Owner).is_err());
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::identity::Principal;
use crate::error::{StoreContext, TenancyError, TenancyResult};
use crate::models::membership::{Membership, MembershipRole};
use crate::store::TenancyStore;

/// The caller's organization and role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrentOrg {
    pub org_id: Uuid,
    pub role: MembershipRole,
}

/// Identity and membership resolved for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    principal: Option<Principal>,
    membership: Option<Membership>,
}

impl RequestContext {
    /// Resolves the caller's membership
    ///
    /// An anonymous caller resolves to an empty context without a store
    /// round-trip.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the membership lookup fails. A failed lookup is
    /// never reported as "no organization".
    pub async fn resolve(
        store: &dyn TenancyStore,
        principal: Option<Principal>,
    ) -> TenancyResult<Self> {
        let Some(principal) = principal else {
            return Ok(Self::anonymous());
        };

        let membership = store
            .find_membership_by_user(principal.user_id)
            .await
            .map_err(|e| {
                warn!(user_id = %principal.user_id, error = %e, "Membership lookup failed");
                e
            })
            .during("resolve membership")?;

        debug!(
            user_id = %principal.user_id,
            org_id = ?membership.as_ref().map(|m| m.org_id),
            "Resolved request context"
        );

        Ok(Self {
            principal: Some(principal),
            membership,
        })
    }

    /// Context for a caller with no identity
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn has_organization(&self) -> bool {
        self.membership.is_some()
    }

    pub fn current_org(&self) -> Option<CurrentOrg> {
        self.membership.as_ref().map(|m| CurrentOrg {
            org_id: m.org_id,
            role: m.role,
        })
    }

    /// Requires an authenticated caller
    pub fn require_principal(&self) -> TenancyResult<&Principal> {
        self.principal.as_ref().ok_or(TenancyError::Unauthenticated)
    }

    /// Requires an authenticated caller with a membership
    pub fn require_member(&self) -> TenancyResult<(&Principal, CurrentOrg)> {
        let principal = self.require_principal()?;
        let org = self.current_org().ok_or(TenancyError::NoOrganization)?;
        Ok((principal, org))
    }

    /// Requires a membership whose role is at least `required`
    pub fn require_role(&self, required: MembershipRole) -> TenancyResult<(&Principal, CurrentOrg)> {
        let (principal, org) = self.require_member()?;

        if !org.role.has_permission(&required) {
            return Err(TenancyError::Forbidden {
                required,
                actual: org.role,
            });
        }

        Ok((principal, org))
    }
}
