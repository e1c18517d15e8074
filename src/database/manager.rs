use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the record store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a raw sqlx error, pulling out referential-integrity failures
    pub fn from_write(err: sqlx::Error, context: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return DatabaseError::ForeignKeyViolation(context.to_string());
            }
        }
        DatabaseError::Sqlx(err)
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS policies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        policy_number TEXT NOT NULL,
        claim_number TEXT,
        date TEXT,
        address TEXT,
        attended INTEGER NOT NULL DEFAULT 0,
        broker_letter_number TEXT,
        broker_letter_date TEXT
    )",
    "CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        policy_id INTEGER NOT NULL REFERENCES policies(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        claim_presented INTEGER NOT NULL DEFAULT 0,
        letter_sent INTEGER NOT NULL DEFAULT 0,
        client_letter_number TEXT,
        client_letter_date TEXT,
        technical_report_path TEXT,
        inspection_report_path TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_clients_policy_id ON clients(policy_id)",
];

/// Owns pool construction and schema setup for the SQLite store
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool against the configured database file, creating it if needed
    pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DatabaseError::InvalidDatabaseUrl(format!("{}: {}", config.url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(options)
            .await?;

        Self::initialize_schema(&pool).await?;
        info!("Opened database pool for: {}", config.url);
        Ok(pool)
    }

    /// Single-connection in-memory store; every connection of a memory URL
    /// would otherwise see its own empty database.
    pub async fn in_memory() -> Result<SqlitePool, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::initialize_schema(&pool).await?;
        Ok(pool)
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn initialize_schema(pool: &SqlitePool) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        }
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let pool = DatabaseManager::in_memory().await.unwrap();
        DatabaseManager::initialize_schema(&pool).await.unwrap();
        DatabaseManager::health_check(&pool).await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('policies', 'clients') ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(tables, vec![("clients".to_string(),), ("policies".to_string(),)]);
    }

    #[tokio::test]
    async fn connect_creates_missing_database_file() {
        let dir = std::env::temp_dir().join(format!("policy-desk-manager-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("store.db");
        let _ = std::fs::remove_file(&path);

        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 2,
            connection_timeout: 5,
        };
        let pool = DatabaseManager::connect(&config).await.unwrap();
        DatabaseManager::health_check(&pool).await.unwrap();
        pool.close().await;

        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
