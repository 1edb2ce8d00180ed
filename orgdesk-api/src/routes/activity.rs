/// Activity feed
///
/// ```text
/// GET /v1/activity?limit=20
/// ```
///
/// Newest audit entries of the caller's organization. `limit` defaults to
/// 20 and is clamped to 1..=100.

use crate::{error::ApiResult, middleware::identity::ScopedStore};
use axum::{
    extract::Query,
    Extension, Json,
};
use orgdesk_shared::auth::RequestContext;
use orgdesk_shared::models::audit_log::AuditLog;
use orgdesk_shared::services::audit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub entries: Vec<AuditLog>,
}

pub async fn list_activity(
    Extension(ScopedStore(store)): Extension<ScopedStore>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<ActivityResponse>> {
    let entries = audit::list_recent(store.as_ref(), &ctx, query.limit).await?;

    Ok(Json(ActivityResponse { entries }))
}
