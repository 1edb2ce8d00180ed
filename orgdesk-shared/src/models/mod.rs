/// Database models for OrgDesk
///
/// Row types plus the SQL that reads and writes them. Every function takes a
/// [`sqlx::PgExecutor`], so the same query runs against the pool or inside a
/// transaction.
///
/// # Models
///
/// - `organization`: Tenants
/// - `membership`: User-organization relationships with roles
/// - `invite`: Single-use membership offers
/// - `project`: Tenant-scoped projects
/// - `task`: Tasks inside projects
/// - `audit_log`: Append-only action trail
///
/// # Example
///
/// ```no_run
/// use orgdesk_shared::models::organization::{Organization, CreateOrganization};
/// use orgdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let org = Organization::create(&pool, CreateOrganization {
///     name: "Acme".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod audit_log;
pub mod invite;
pub mod membership;
pub mod organization;
pub mod project;
pub mod task;
