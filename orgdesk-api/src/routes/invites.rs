/// Invite endpoints
///
/// # Endpoints
///
/// - `POST /v1/invites` - Invite an email address (owner only)
/// - `GET /v1/invites` - Pending invites (owner only)
/// - `POST /v1/invites/accept` - Redeem a token as the signed-in user
///
/// Invites are not emailed; the created invite, token included, is
/// returned to the owner to pass on.

use crate::{error::ApiResult, middleware::identity::ScopedStore};
use axum::{http::StatusCode, Extension, Json};
use orgdesk_shared::auth::RequestContext;
use orgdesk_shared::models::invite::Invite;
use orgdesk_shared::services::invites;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInviteRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: String,
}

/// Accept invite response
///
/// ```json
/// { "success": true, "org_id": "uuid" }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptInviteResponse {
    pub success: bool,
    pub org_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ListInvitesResponse {
    pub invites: Vec<Invite>,
}

pub async fn create_invite(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateInviteRequest>,
) -> ApiResult<(StatusCode, Json<Invite>)> {
    req.validate()?;

    let invite = invites::create_invite(store.as_ref(), &ctx, &req.email).await?;

    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn list_pending_invites(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<ListInvitesResponse>> {
    let invites = invites::list_pending_invites(store.as_ref(), &ctx).await?;

    Ok(Json(ListInvitesResponse { invites }))
}

/// Redeems an invite
///
/// # Errors
///
/// - `400 invalid_invite`: token malformed or not issued to the caller's email
/// - `409 Conflict`: already accepted, or caller already has an organization
pub async fn accept_invite(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<AcceptInviteRequest>,
) -> ApiResult<Json<AcceptInviteResponse>> {
    let principal = ctx.require_principal()?;

    let membership = invites::accept_invite(store.as_ref(), principal, &req.token).await?;

    Ok(Json(AcceptInviteResponse {
        success: true,
        org_id: membership.org_id,
    }))
}
