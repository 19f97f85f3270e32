use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Lazily-initialized shared connection pool for the application database
pub struct DatabaseManager {
    pool: Arc<RwLock<Option<PgPool>>>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager { pool: Arc::new(RwLock::new(None)) })
    }

    /// Get the application database pool, creating it on first use
    pub async fn pool() -> Result<PgPool, DatabaseError> {
        let manager = Self::instance();

        // Fast path: try read lock
        {
            let pool = manager.pool.read().await;
            if let Some(pool) = pool.as_ref() {
                return Ok(pool.clone());
            }
        }

        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
            .connect(&url)
            .await?;

        {
            let mut slot = manager.pool.write().await;
            // Another task may have raced us here; keep the first pool
            if let Some(existing) = slot.as_ref() {
                pool.close().await;
                return Ok(existing.clone());
            }
            *slot = Some(pool.clone());
        }

        info!("Created database pool");
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        let manager = Self::instance();
        let mut slot = manager.pool.write().await;
        if let Some(pool) = slot.take() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
