/// PostgreSQL connection pool
///
/// Builds a sqlx pool from [`DatabaseConfig`] and refuses to hand it out
/// until `SELECT 1` succeeds, so a bad `DATABASE_URL` fails at startup
/// rather than on the first request.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection pool settings
///
/// Timeouts are in seconds so they map directly onto environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Upper bound on open connections
    pub max_connections: u32,

    /// Idle connections kept warm
    pub min_connections: u32,

    /// How long `acquire` waits for a free connection
    pub acquire_timeout_seconds: u64,

    /// Idle connections older than this are closed; `None` keeps them
    pub idle_timeout_seconds: Option<u64>,

    /// Connections are recycled after this long; `None` keeps them forever
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 5,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
        }
    }
}

/// Creates the pool and verifies connectivity
///
/// # Errors
///
/// Returns the underlying sqlx error if the URL is malformed, the server is
/// unreachable, or the health check fails.
///
/// # Example
///
/// ```no_run
/// use orgdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     max_connections: 20,
///     ..Default::default()
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_seconds = config.acquire_timeout_seconds,
        "Creating database connection pool"
    );

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));

    if let Some(idle) = config.idle_timeout_seconds {
        options = options.idle_timeout(Duration::from_secs(idle));
    }
    if let Some(lifetime) = config.max_lifetime_seconds {
        options = options.max_lifetime(Duration::from_secs(lifetime));
    }

    let pool = options.connect(&config.url).await?;
    health_check(&pool).await?;

    info!("Database connection pool ready");
    Ok(pool)
}

/// Runs `SELECT 1` against the pool
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let (value,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if value == 1 {
        debug!("Database health check passed");
        Ok(())
    } else {
        warn!(value, "Database health check returned unexpected value");
        Err(sqlx::Error::Protocol(
            "health check returned unexpected value".into(),
        ))
    }
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub active_connections: usize,
    pub idle_connections: usize,
    pub total_connections: usize,
}

impl PoolStats {
    fn from_counts(size: u32, idle: usize) -> Self {
        let size = size as usize;
        Self {
            active_connections: size.saturating_sub(idle),
            idle_connections: idle,
            total_connections: size,
        }
    }
}

pub fn get_pool_stats(pool: &PgPool) -> PoolStats {
    PoolStats::from_counts(pool.size(), pool.num_idle())
}

/// Closes every connection; call once on shutdown
pub async fn close_pool(pool: PgPool) {
    info!("Closing database connection pool");
    pool.close().await;
}
