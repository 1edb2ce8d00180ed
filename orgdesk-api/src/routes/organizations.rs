/// Organization endpoints
///
/// # Endpoints
///
/// - `GET /v1/org` - Whether the caller has an organization, and which
/// - `POST /v1/organizations` - Create an organization owned by the caller
/// - `GET /v1/org/members` - Members of the caller's organization

use crate::{error::ApiResult, middleware::identity::ScopedStore};
use axum::{http::StatusCode, Extension, Json};
use orgdesk_shared::auth::RequestContext;
use orgdesk_shared::models::membership::{Membership, MembershipRole};
use orgdesk_shared::models::organization::Organization;
use orgdesk_shared::services::organizations;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Current organization response
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentOrgResponse {
    pub has_organization: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MembershipRole>,
}

/// Create organization request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

/// Members response
#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub members: Vec<Membership>,
}

/// Reports the caller's organization
///
/// Both fields come from the context resolved for this request, so they
/// always agree.
///
/// ```json
/// { "has_organization": true, "org_id": "uuid", "role": "owner" }
/// ```
pub async fn current_org(Extension(ctx): Extension<RequestContext>) -> Json<CurrentOrgResponse> {
    let current = ctx.current_org();

    Json(CurrentOrgResponse {
        has_organization: ctx.has_organization(),
        org_id: current.map(|org| org.org_id),
        role: current.map(|org| org.role),
    })
}

/// Creates an organization
///
/// # Endpoint
///
/// ```text
/// POST /v1/organizations
/// Authorization: Bearer <jwt_token>
///
/// { "name": "Acme" }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: caller already belongs to an organization
/// - `422 Unprocessable Entity`: blank or overlong name
/// - `500 partial_failure`: organization created without its owner membership
pub async fn create_organization(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    req.validate()?;

    let org = organizations::create_organization(store.as_ref(), &ctx, &req.name).await?;

    Ok((StatusCode::CREATED, Json(org)))
}

/// Lists members of the caller's organization
pub async fn list_members(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Json<MembersResponse>> {
    let members = organizations::list_members(store.as_ref(), &ctx).await?;

    Ok(Json(MembersResponse { members }))
}
