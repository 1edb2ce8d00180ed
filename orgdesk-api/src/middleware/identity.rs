/// Identity middleware
///
/// Verifies the `Authorization: Bearer <jwt>` header against the identity
/// provider secret, scopes the store to the caller, resolves the caller's
/// membership once, and stores both the [`ScopedStore`] and the resulting
/// [`RequestContext`] in the request extensions. Handlers take them with
/// `Extension` and pass them to the services unchanged.
///
/// A missing or invalid token is rejected with 401 before any handler runs.
/// A store failure during resolution is 503, never "no organization".

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use orgdesk_shared::auth::identity::verify_bearer;
use orgdesk_shared::auth::RequestContext;
use orgdesk_shared::store::TenancyStore;
use std::sync::Arc;

use crate::{app::AppState, error::ApiError};

/// Store handle acting on behalf of the request's caller
#[derive(Clone)]
pub struct ScopedStore(pub Arc<dyn TenancyStore>);

pub async fn identity_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = {
        let token = bearer_token(&req)?;
        verify_bearer(token, state.jwt_secret())?
    };

    let store = state.store.scoped_to(&principal);
    let ctx = RequestContext::resolve(store.as_ref(), Some(principal)).await?;

    req.extensions_mut().insert(ScopedStore(store));
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Result<&str, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))
}
