use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bulkq_core::{config::DatabaseConfig, traits::RecordStore, BulkqError, BulkqResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use tracing::{debug, info};

use super::postgres::PostgresRecordStore;
use super::sqlite::SqliteRecordStore;

const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    field1 VARCHAR(50) NOT NULL,
    field2 VARCHAR(50) NOT NULL
)
"#;

const POSTGRES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id BIGSERIAL PRIMARY KEY,
    field1 VARCHAR(50) NOT NULL,
    field2 VARCHAR(50) NOT NULL
)
"#;

/// Database type detection
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// Database connection pool enum
#[derive(Clone)]
pub enum DatabasePool {
    PostgreSQL(sqlx::PgPool),
    SQLite(sqlx::SqlitePool),
}

impl DatabasePool {
    /// Create pool from config with automatic type detection
    pub async fn new(config: &DatabaseConfig) -> BulkqResult<Self> {
        match DatabaseType::from_url(&config.url) {
            DatabaseType::PostgreSQL => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
                    .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                    .connect(&config.url)
                    .await
                    .map_err(BulkqError::Storage)?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite => {
                let mut options = SqliteConnectOptions::from_str(&config.url)
                    .map_err(BulkqError::Storage)?
                    .create_if_missing(true)
                    .busy_timeout(Duration::from_secs(config.connection_timeout_seconds));

                let mut pool_options = sqlx::sqlite::SqlitePoolOptions::new()
                    .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds));

                if config.is_in_memory() {
                    // 每个连接都是独立的内存库，只能保留唯一且常驻的连接
                    pool_options = pool_options
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                } else {
                    options = options.journal_mode(SqliteJournalMode::Wal);
                    pool_options = pool_options
                        .max_connections(config.max_connections)
                        .min_connections(config.min_connections)
                        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));
                }

                let pool = pool_options
                    .connect_with(options)
                    .await
                    .map_err(BulkqError::Storage)?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            DatabasePool::PostgreSQL(_) => DatabaseType::PostgreSQL,
            DatabasePool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    pub async fn health_check(&self) -> BulkqResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(BulkqError::Storage)?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(BulkqError::Storage)?;
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::PostgreSQL(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }
}

/// Unified database manager
pub struct DatabaseManager {
    pool: DatabasePool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> BulkqResult<Self> {
        let pool = DatabasePool::new(config).await?;
        info!(
            "Connected to {:?} database (max_connections: {})",
            pool.database_type(),
            config.max_connections
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub fn database_type(&self) -> DatabaseType {
        self.pool.database_type()
    }

    /// Create the `records` table if it does not exist
    pub async fn migrate(&self) -> BulkqResult<()> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query(POSTGRES_SCHEMA)
                    .execute(pool)
                    .await
                    .map_err(BulkqError::Storage)?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query(SQLITE_SCHEMA)
                    .execute(pool)
                    .await
                    .map_err(BulkqError::Storage)?;
            }
        }
        debug!("Database schema is up to date");
        Ok(())
    }

    pub async fn health_check(&self) -> BulkqResult<()> {
        self.pool.health_check().await
    }

    pub async fn close(&self) {
        self.pool.close().await
    }

    /// Factory method for the record store
    pub fn record_store(&self) -> Arc<dyn RecordStore> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresRecordStore::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteRecordStore::new(pool.clone())),
        }
    }
}
