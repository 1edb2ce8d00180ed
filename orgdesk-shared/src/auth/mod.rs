/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: identity provider token claims and HS256 validation
/// - [`identity`]: maps a validated token to a [`identity::Principal`]
/// - [`authorization`]: per-request membership resolution and role gates
/// - [`invite_token`]: invite token generation and format checks

pub mod authorization;
pub mod identity;
pub mod invite_token;
pub mod jwt;

pub use authorization::{CurrentOrg, RequestContext};
pub use identity::Principal;
