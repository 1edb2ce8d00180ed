/// Identity boundary
///
/// Turns a verified identity token into a [`Principal`]. Everything past
/// this point trusts `user_id` and `email` as given by the provider.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};

/// An authenticated user as seen by the tenancy core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,

    /// Normalized with [`normalize_email`]
    pub email: String,
}

impl Principal {
    pub fn new(user_id: Uuid, email: &str) -> Self {
        Self {
            user_id,
            email: normalize_email(email),
        }
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal::new(claims.sub, &claims.email)
    }
}

/// Validates a bearer token and returns its principal
pub fn verify_bearer(token: &str, secret: &str) -> Result<Principal, JwtError> {
    validate_token(token, secret).map(Principal::from)
}

/// Trims and ASCII-lowercases an email for comparison and storage
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
