use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{MySql, MySqlPool};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::database::models::UnknownVariant;

/// Errors from the task store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to create connection pool: {0}")]
    PoolCreation(#[source] sqlx::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(#[from] UnknownVariant),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the process-wide MySQL pool. The pool is created on first use and
/// shared by every request for the lifetime of the process.
pub struct DatabaseManager {
    config: DatabaseConfig,
    pool: OnceCell<MySqlPool>,
}

impl DatabaseManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    /// Get the pool, creating it if this is the first call. A failed attempt
    /// leaves the cell empty so a later request tries again.
    pub async fn pool(&self) -> Result<&MySqlPool, DatabaseError> {
        self.pool
            .get_or_try_init(|| async {
                info!("Creating MySQL connection pool...");
                match self.pool_options().connect_with(self.connect_options()).await {
                    Ok(pool) => {
                        info!(
                            "MySQL connection pool created successfully ({} connections max)",
                            self.config.pool_size
                        );
                        Ok(pool)
                    }
                    Err(e) => {
                        error!("Failed to create connection pool: {}", e);
                        Err(DatabaseError::PoolCreation(e))
                    }
                }
            })
            .await
    }

    /// Check out a connection. It goes back to the pool when dropped,
    /// whichever way the caller exits.
    pub async fn acquire(&self) -> Result<PoolConnection<MySql>, DatabaseError> {
        let pool = self.pool().await?;
        Ok(pool.acquire().await?)
    }

    /// Close the pool if it was ever created (e.g., on shutdown)
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Closed database pool: {}", self.config.name);
        }
    }

    fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.config.pool_size)
            .acquire_timeout(Duration::from_secs(self.config.acquire_timeout_secs))
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.name)
    }
}
