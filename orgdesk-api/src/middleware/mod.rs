/// Middleware for the API server
///
/// - `identity`: bearer token verification and per-request membership
///   resolution

pub mod identity;
