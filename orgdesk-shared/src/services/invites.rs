/// Invite lifecycle
///
/// Owners invite by email; the invitee redeems the token while signed in
/// with that same email and becomes a `member`. Redemption is a single
/// atomic store operation, so two concurrent redemptions of one token
/// produce exactly one membership and one `AlreadyAccepted`.

use serde_json::json;
use tracing::{info, warn};
use validator::ValidateEmail;

use super::audit;
use crate::auth::identity::normalize_email;
use crate::auth::invite_token::{generate_invite_token, is_well_formed};
use crate::auth::{Principal, RequestContext};
use crate::error::{StoreContext, StoreError, TenancyError, TenancyResult};
use crate::models::audit_log::{actions, entities, AuditEntry};
use crate::models::invite::{self, CreateInvite, Invite, MAX_EMAIL_LENGTH};
use crate::models::membership::{Membership, MembershipRole};
use crate::store::TenancyStore;

/// Attempts at drawing an unused token before giving up
const TOKEN_ATTEMPTS: usize = 3;

/// Issues an invite to `email` for the caller's organization
///
/// # Errors
///
/// - `Unauthenticated` / `NoOrganization` / `Forbidden` (owner only)
/// - `InvalidInput` if the email is blank, too long or malformed
pub async fn create_invite(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
    email: &str,
) -> TenancyResult<Invite> {
    let (principal, org) = ctx.require_role(MembershipRole::Owner)?;
    let email = validate_invitee_email(email)?;

    let mut attempt = 0;
    let invite = loop {
        attempt += 1;
        let result = store
            .insert_invite(CreateInvite {
                org_id: org.org_id,
                email: email.clone(),
                invited_by: principal.user_id,
                token: generate_invite_token(),
            })
            .await;

        match result {
            Err(e) if e.is_unique_violation(invite::TOKEN_CONSTRAINT) && attempt < TOKEN_ATTEMPTS => {
                warn!(org_id = %org.org_id, attempt, "Invite token collision, regenerating");
            }
            other => break other.during("create invite")?,
        }
    };

    audit::record(
        store,
        AuditEntry::new(org.org_id, Some(principal.user_id), actions::MEMBER_INVITED)
            .entity(entities::INVITE, invite.id)
            .metadata(json!({ "email": invite.email })),
    )
    .await;

    info!(org_id = %org.org_id, invite_id = %invite.id, "Invite created");
    Ok(invite)
}

/// Redeems an invite for `principal`
///
/// The invite must carry `principal`'s email. On success the caller holds a
/// `member` membership in the inviting organization.
///
/// # Errors
///
/// - `InvalidInvite` for a malformed token or no token/email match
/// - `AlreadyAccepted` if the invite was redeemed before or concurrently
/// - `DuplicateMembership` if the caller already belongs to an organization
///   (the invite stays pending)
pub async fn accept_invite(
    store: &dyn TenancyStore,
    principal: &Principal,
    token: &str,
) -> TenancyResult<Membership> {
    let token = token.trim();
    if !is_well_formed(token) {
        return Err(TenancyError::InvalidInvite);
    }

    let invite = store
        .find_invite(token, &principal.email)
        .await
        .during("look up invite")?
        .ok_or(TenancyError::InvalidInvite)?;

    if invite.accepted {
        return Err(TenancyError::AlreadyAccepted);
    }

    let membership = store
        .redeem_invite(invite.id, principal.user_id)
        .await
        .map_err(|e| match e {
            StoreError::InviteAlreadyAccepted => TenancyError::AlreadyAccepted,
            StoreError::UniqueViolation { .. } => TenancyError::DuplicateMembership,
            // organization removed since the invite was issued
            StoreError::ForeignKeyViolation { .. } => TenancyError::InvalidInvite,
            source => TenancyError::store("redeem invite", source),
        })?;

    audit::record(
        store,
        AuditEntry::new(membership.org_id, Some(principal.user_id), actions::MEMBER_JOINED)
            .entity(entities::MEMBERSHIP, membership.id)
            .metadata(json!({ "invite_id": invite.id })),
    )
    .await;

    info!(
        org_id = %membership.org_id,
        user_id = %principal.user_id,
        invite_id = %invite.id,
        "Invite accepted"
    );
    Ok(membership)
}

/// Pending invites of the caller's organization, newest first (owner only)
pub async fn list_pending_invites(
    store: &dyn TenancyStore,
    ctx: &RequestContext,
) -> TenancyResult<Vec<Invite>> {
    let (_, org) = ctx.require_role(MembershipRole::Owner)?;

    store
        .list_pending_invites(org.org_id)
        .await
        .during("list invites")
}

fn validate_invitee_email(raw: &str) -> TenancyResult<String> {
    let email = normalize_email(raw);

    if email.is_empty() {
        return Err(TenancyError::invalid("email", "must not be empty"));
    }
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(TenancyError::invalid(
            "email",
            format!("must be at most {} characters", MAX_EMAIL_LENGTH),
        ));
    }
    if !email.validate_email() {
        return Err(TenancyError::invalid("email", "is not a valid email address"));
    }

    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::organizations::create_organization;
    use crate::store::{MemoryStore, StoreOp};
    use uuid::Uuid;

    async fn owner_ctx(store: &MemoryStore) -> RequestContext {
        let owner = Principal::new(Uuid::new_v4(), "owner@example.com");
        let ctx = RequestContext::resolve(store, Some(owner.clone())).await.unwrap();
        create_organization(store, &ctx, "Acme").await.unwrap();
        RequestContext::resolve(store, Some(owner)).await.unwrap()
    }

    #[test]
    fn test_validate_invitee_email() {
        assert_eq!(validate_invitee_email("  B@X.com ").unwrap(), "b@x.com");
        assert!(validate_invitee_email("").is_err());
        assert!(validate_invitee_email("not-an-email").is_err());

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_invitee_email(&long).is_err());
    }

    #[tokio::test]
    async fn test_invite_email_is_normalized() {
        let store = MemoryStore::new();
        let ctx = owner_ctx(&store).await;

        let invite = create_invite(&store, &ctx, "B@X.COM").await.unwrap();
        assert_eq!(invite.email, "b@x.com");
        assert!(is_well_formed(&invite.token));
        assert!(!invite.accepted);
    }

    #[tokio::test]
    async fn test_malformed_token_skips_store() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::FindInvite);
        let principal = Principal::new(Uuid::new_v4(), "b@x.com");

        let err = accept_invite(&store, &principal, "garbage").await.unwrap_err();
        assert!(matches!(err, TenancyError::InvalidInvite));
    }

    #[tokio::test]
    async fn test_accept_requires_matching_email() {
        let store = MemoryStore::new();
        let ctx = owner_ctx(&store).await;
        let invite = create_invite(&store, &ctx, "b@x.com").await.unwrap();

        let stranger = Principal::new(Uuid::new_v4(), "c@x.com");
        let err = accept_invite(&store, &stranger, &invite.token).await.unwrap_err();
        assert!(matches!(err, TenancyError::InvalidInvite));

        let invitee = Principal::new(Uuid::new_v4(), "B@x.com");
        let membership = accept_invite(&store, &invitee, &invite.token).await.unwrap();
        assert_eq!(membership.role, MembershipRole::Member);
    }

    #[tokio::test]
    async fn test_accept_while_already_member_keeps_invite_pending() {
        let store = MemoryStore::new();
        let ctx = owner_ctx(&store).await;
        let invite = create_invite(&store, &ctx, "b@x.com").await.unwrap();

        let invitee = Principal::new(Uuid::new_v4(), "b@x.com");
        let own_ctx = RequestContext::resolve(&store, Some(invitee.clone())).await.unwrap();
        create_organization(&store, &own_ctx, "Elsewhere").await.unwrap();

        let err = accept_invite(&store, &invitee, &invite.token).await.unwrap_err();
        assert!(matches!(err, TenancyError::DuplicateMembership));

        let pending = list_pending_invites(&store, &ctx).await.unwrap();
        assert_eq!(pending.len(), 1);
    }
}
