/// Schema migrations
///
/// The SQL under the workspace `migrations/` directory is embedded at compile
/// time with `sqlx::migrate!`, so the binary carries its own schema. Each
/// migration is a reversible `.up.sql` / `.down.sql` pair.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Migration bookkeeping read from `_sqlx_migrations`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied_migrations: usize,
    pub latest_version: Option<i64>,
    /// Number of embedded migrations not yet applied
    pub pending_migrations: usize,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending_migrations == 0
    }
}

fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("../migrations")
}

/// Applies every pending migration
///
/// # Errors
///
/// Fails if a migration script errors or a previously applied migration was
/// edited after the fact (checksum mismatch).
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    migrator().run(pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Compares applied migrations with the embedded set
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    let embedded = migrator()
        .iter()
        .filter(|m| m.migration_type.is_up_migration())
        .count();

    if !table_exists {
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
            pending_migrations: embedded,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = TRUE",
    )
    .fetch_one(pool)
    .await?;

    let applied = count as usize;
    Ok(MigrationStatus {
        applied_migrations: applied,
        latest_version,
        pending_migrations: embedded.saturating_sub(applied),
    })
}
