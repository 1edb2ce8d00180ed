/// Identity provider tokens
///
/// The identity provider issues HS256-signed JWTs; this module builds and
/// checks them. OrgDesk itself only ever validates tokens. [`create_token`]
/// exists for tooling and tests that need to mint one.
///
/// # Validation
///
/// - **Algorithm**: HS256 only
/// - **Issuer**: must be [`ISSUER`]
/// - **Time**: `exp` and `nbf` are enforced
///
/// # Example
///
/// ```
/// use orgdesk_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "an-identity-secret-of-at-least-32-bytes";
/// let user_id = Uuid::new_v4();
///
/// let token = create_token(&Claims::new(user_id, "ada@example.com"), secret)?;
/// let claims = validate_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim expected on every token
pub const ISSUER: &str = "orgdesk-identity";

/// Lifetime of tokens minted by [`Claims::new`]
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token is not valid yet")]
    NotYetValid,

    #[error("Invalid issuer: expected {}", ISSUER)]
    InvalidIssuer,
}

/// Claims carried by an identity token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID at the identity provider
    pub sub: Uuid,

    /// Email address the provider verified for the user
    pub email: String,

    /// Issuer - always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Claims valid from now for [`DEFAULT_TTL_HOURS`]
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self::with_expiration(user_id, email, Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Claims valid from now for `expires_in`
    ///
    /// A negative duration yields an already expired token.
    pub fn with_expiration(user_id: Uuid, email: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email: email.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Verifies signature, issuer and validity window, then returns the claims
///
/// # Errors
///
/// - [`JwtError::Expired`] past `exp`
/// - [`JwtError::NotYetValid`] before `nbf`
/// - [`JwtError::InvalidIssuer`] when `iss` is not [`ISSUER`]
/// - [`JwtError::ValidationError`] for a bad signature or malformed token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::ImmatureSignature => JwtError::NotYetValid,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            _ => JwtError::ValidationError(e.to_string()),
        })
}
