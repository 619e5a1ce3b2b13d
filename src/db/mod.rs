pub mod repositories;

use std::path::Path;
use std::time::Instant;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};

use crate::config::Settings;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
    pub db_path: String,
}

impl Database {
    pub async fn connect(settings: &Settings) -> Result<Self, sqlx::Error> {
        let db_path = settings.database_path.clone();

        // Ensure parent directory exists
        if let Some(parent) = Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(settings.database_pool_timeout))
            .pragma("foreign_keys", "ON")
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.database_pool_size)
            .acquire_timeout(std::time::Duration::from_secs(settings.database_pool_timeout))
            .connect_with(connect_options)
            .await?;

        let db = Self {
            pool,
            db_path: db_path.clone(),
        };

        // Verify connection
        let version: (String,) = sqlx::query_as("SELECT sqlite_version()")
            .fetch_one(&db.pool)
            .await?;
        tracing::info!(
            sqlite_version = %version.0,
            path = %db_path,
            pool_size = settings.database_pool_size,
            "Connected to SQLite database"
        );

        Ok(db)
    }

    pub async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => HealthCheckResult {
                status: "up".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as i64),
                error: None,
            },
            Err(e) => HealthCheckResult {
                status: "down".to_string(),
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }
}

pub struct HealthCheckResult {
    pub status: String,
    pub latency_ms: Option<i64>,
    pub error: Option<String>,
}

/// In-memory pool for unit tests. Single connection, since every SQLite
/// `:memory:` connection gets its own database.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::raw_sql(include_str!("../../migrations/sqlite/0001_init.sql"))
        .execute(&pool)
        .await
        .expect("Failed to apply schema");

    pool
}

pub async fn run_migrations(pool: &SqlitePool, migrations_dir: &str) -> Result<(), sqlx::Error> {
    let path = Path::new(migrations_dir);

    if !path.exists() {
        tracing::warn!(path = %migrations_dir, "Migrations directory not found, skipping");
        return Ok(());
    }

    let migrator = Migrator::new(path).await?;
    migrator.run(pool).await?;

    tracing::info!("Migrations applied successfully");
    Ok(())
}
