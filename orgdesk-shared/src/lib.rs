//! # OrgDesk Shared Library
//!
//! The multi-tenant core of OrgDesk: organizations, memberships, invites,
//! projects, tasks and the audit trail, plus the authorization gate every
//! operation passes through. The HTTP API is a thin layer over this crate.
//!
//! ## Module Organization
//!
//! - `auth`: identity tokens, request context resolution, role gates
//! - `services`: one function per tenancy operation
//! - `store`: the `TenancyStore` trait with Postgres and in-memory backends
//! - `models`: row types and their SQL
//! - `db`: connection pool and migrations
//! - `error`: store and tenancy error types
//!
//! ## Example
//!
//! ```
//! use orgdesk_shared::auth::{Principal, RequestContext};
//! use orgdesk_shared::services::{organizations, projects};
//! use orgdesk_shared::store::MemoryStore;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let ada = Principal::new(Uuid::new_v4(), "ada@example.com");
//!
//! let ctx = RequestContext::resolve(&store, Some(ada.clone())).await?;
//! organizations::create_organization(&store, &ctx, "Acme").await?;
//!
//! // Membership changed, so resolve again for the next request
//! let ctx = RequestContext::resolve(&store, Some(ada)).await?;
//! projects::create_project(&store, &ctx, "Launch").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{StoreError, TenancyError, TenancyResult};

/// Current version of the OrgDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
