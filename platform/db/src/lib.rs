//! Connection settings and pool setup for the HR stores.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::debug;

/// Shared connection pool alias.
pub type DbPool = DatabaseConnection;

pub const DEFAULT_DATABASE_URL: &str = "postgres://hr:hr@localhost:5432/hr";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },
    #[error("database connection failed: {0}")]
    Connect(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    url: String,
    max_connections: u32,
    connect_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Reads `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`.
    pub fn from_env() -> DbResult<Self> {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
        let mut settings = Self::new(url);
        if let Ok(raw) = std::env::var("DATABASE_MAX_CONNECTIONS") {
            let parsed = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(DbError::InvalidSetting {
                    key: "DATABASE_MAX_CONNECTIONS",
                    value: raw.clone(),
                })?;
            settings = settings.with_max_connections(parsed);
        }
        Ok(settings)
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn is_in_memory(&self) -> bool {
        self.url.starts_with("sqlite::memory:")
    }

    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.url.clone());
        // every in-memory sqlite connection opens its own empty database
        let max = if self.is_in_memory() {
            1
        } else {
            self.max_connections
        };
        options
            .max_connections(max)
            .connect_timeout(self.connect_timeout)
            .sqlx_logging(false);
        options
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    debug!(max_connections = settings.max_connections, "opening database pool");
    Database::connect(settings.connect_options())
        .await
        .map_err(DbError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sqlite_is_pinned_to_one_connection() {
        let options = DatabaseSettings::new("sqlite::memory:")
            .with_max_connections(8)
            .connect_options();
        assert_eq!(options.get_max_connections(), Some(1));
    }

    #[test]
    fn server_urls_keep_configured_pool_size() {
        let options = DatabaseSettings::new(DEFAULT_DATABASE_URL)
            .with_max_connections(8)
            .connect_options();
        assert_eq!(options.get_max_connections(), Some(8));
    }

    #[tokio::test]
    async fn connects_to_sqlite() {
        let pool = connect(&DatabaseSettings::new("sqlite::memory:"))
            .await
            .unwrap();
        pool.ping().await.unwrap();
    }
}
