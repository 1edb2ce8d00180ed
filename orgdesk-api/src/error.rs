/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; tenancy and token errors convert into
/// [`ApiError`] with `?` and render as a JSON body:
///
/// ```json
/// { "error": "no_organization", "message": "No organization found" }
/// ```
///
/// # Status mapping
///
/// | Tenancy error | Status | `error` |
/// |---|---|---|
/// | `Unauthenticated` | 401 | `unauthorized` |
/// | `NoOrganization` | 403 | `no_organization` |
/// | `Forbidden` | 403 | `forbidden` |
/// | `InvalidInput` | 422 | `validation_error` |
/// | `InvalidInvite` | 400 | `invalid_invite` |
/// | `AlreadyAccepted`, `DuplicateMembership` | 409 | `conflict` |
/// | `NotFound` | 404 | `not_found` |
/// | `StoreUnavailable` | 503 | `service_unavailable` |
/// | `Storage` | 500 | `internal_error` |
/// | `PartialFailure` | 500 | `partial_failure` |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orgdesk_shared::auth::jwt::JwtError;
use orgdesk_shared::TenancyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Invite token/email did not match (400)
    InvalidInvite(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Role too low (403)
    Forbidden(String),

    /// Caller has no organization yet (403)
    NoOrganization(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409)
    Conflict(String),

    /// Unprocessable entity (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Onboarding left an organization without its owner (500)
    PartialFailure(String),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "forbidden", "no_organization")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidInvite(_) => (StatusCode::BAD_REQUEST, "invalid_invite"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::NoOrganization(_) => (StatusCode::FORBIDDEN, "no_organization"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::ValidationError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ApiError::PartialFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "partial_failure"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidInvite(msg) => write!(f, "Invalid invite: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NoOrganization(msg) => write!(f, "No organization: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::PartialFailure(msg) => write!(f, "Partial failure: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let (message, details) = match self {
            ApiError::ValidationError(errors) => ("Request validation failed".to_string(), Some(errors)),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                ("The service is temporarily unavailable, please retry".to_string(), None)
            }
            ApiError::PartialFailure(msg) => {
                tracing::error!("Partial failure: {}", msg);
                (msg, None)
            }
            ApiError::InvalidInvite(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NoOrganization(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => (msg, None),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert tenancy errors to API errors
impl From<TenancyError> for ApiError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::Unauthenticated => ApiError::Unauthorized(err.to_string()),
            TenancyError::NoOrganization => ApiError::NoOrganization(err.to_string()),
            TenancyError::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
            TenancyError::InvalidInput { field, reason } => {
                ApiError::ValidationError(vec![ValidationErrorDetail {
                    field: field.to_string(),
                    message: reason,
                }])
            }
            TenancyError::InvalidInvite => ApiError::InvalidInvite(err.to_string()),
            TenancyError::AlreadyAccepted | TenancyError::DuplicateMembership => {
                ApiError::Conflict(err.to_string())
            }
            TenancyError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            TenancyError::StoreUnavailable { .. } => ApiError::ServiceUnavailable(err.to_string()),
            TenancyError::Storage { .. } => ApiError::InternalError(err.to_string()),
            TenancyError::PartialFailure { .. } => ApiError::PartialFailure(err.to_string()),
        }
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::NotYetValid => ApiError::Unauthorized("Token not valid yet".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

/// Convert request validation failures to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgdesk_shared::models::membership::MembershipRole;
    use orgdesk_shared::StoreError;
    use uuid::Uuid;

    #[test]
    fn test_tenancy_error_status_mapping() {
        let cases = vec![
            (TenancyError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (TenancyError::NoOrganization, StatusCode::FORBIDDEN),
            (
                TenancyError::Forbidden {
                    required: MembershipRole::Owner,
                    actual: MembershipRole::Member,
                },
                StatusCode::FORBIDDEN,
            ),
            (TenancyError::invalid("name", "must not be empty"), StatusCode::UNPROCESSABLE_ENTITY),
            (TenancyError::InvalidInvite, StatusCode::BAD_REQUEST),
            (TenancyError::AlreadyAccepted, StatusCode::CONFLICT),
            (TenancyError::DuplicateMembership, StatusCode::CONFLICT),
            (TenancyError::NotFound { entity: "project" }, StatusCode::NOT_FOUND),
            (
                TenancyError::StoreUnavailable {
                    action: "list projects",
                    source: StoreError::Unavailable("timeout".to_string()),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                TenancyError::store(
                    "create invite",
                    StoreError::UniqueViolation {
                        constraint: "invites_token_key".to_string(),
                    },
                ),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                TenancyError::PartialFailure {
                    org_id: Uuid::new_v4(),
                    orphan_removed: true,
                    reason: "boom".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status(), expected, "{}", api);
        }
    }

    #[test]
    fn test_partial_failure_names_org() {
        let org_id = Uuid::new_v4();
        let api: ApiError = TenancyError::PartialFailure {
            org_id,
            orphan_removed: false,
            reason: "insert failed".to_string(),
        }
        .into();

        assert!(api.to_string().contains(&org_id.to_string()));
    }

    #[test]
    fn test_invalid_input_carries_field() {
        let api: ApiError = TenancyError::invalid("title", "must not be empty").into();
        match api {
            ApiError::ValidationError(details) => {
                assert_eq!(
                    details,
                    vec![ValidationErrorDetail {
                        field: "title".to_string(),
                        message: "must not be empty".to_string(),
                    }]
                );
            }
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn test_jwt_errors_are_unauthorized() {
        let api: ApiError = JwtError::Expired.into();
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);

        let api: ApiError = JwtError::ValidationError("bad signature".to_string()).into();
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
    }
}
