//! Lazily established, process-wide handle to the task store.

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tokio::sync::OnceCell;

use crate::config::Config;

/// Pool size used when the caller does not configure one.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Error type for establishing the store connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The connection string was empty.
    #[error("Database URL is not configured")]
    MissingUrl,
    /// The store could not be reached or the URL was malformed.
    #[error("Failed to connect to the task store: {0}")]
    Connect(#[source] DbErr),
    /// The store was reached but the task layout could not be applied.
    #[error("Failed to prepare the task store layout: {0}")]
    Layout(#[source] DbErr),
}

/// Owns the single connection pool shared by every task operation.
///
/// The first caller of [`DataStore::connect`] opens the pool and applies the
/// task layout; concurrent first callers wait on the same initialization
/// instead of opening pools of their own. Later calls return the cached handle.
/// A failed attempt is not cached, so the next call tries again.
#[derive(Debug)]
pub struct DataStore {
    url: String,
    max_connections: u32,
    connection: OnceCell<DatabaseConnection>,
}

impl DataStore {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection: OnceCell::new(),
        }
    }

    /// Builds a store from the process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.database_url.clone()).with_max_connections(config.max_connections)
    }

    /// Caps the pool size. In-memory SQLite stores need exactly one connection.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Returns the shared connection, establishing it on first use.
    pub async fn connect(&self) -> Result<&DatabaseConnection, ConnectionError> {
        self.connection.get_or_try_init(|| self.establish()).await
    }

    /// Whether a connection has already been established.
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    #[tracing::instrument(skip(self), fields(max_connections = self.max_connections))]
    async fn establish(&self) -> Result<DatabaseConnection, ConnectionError> {
        if self.url.trim().is_empty() {
            return Err(ConnectionError::MissingUrl);
        }

        let mut options = ConnectOptions::new(self.url.clone());
        options
            .max_connections(self.max_connections)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .map_err(ConnectionError::Connect)?;
        Migrator::up(&db, None)
            .await
            .map_err(ConnectionError::Layout)?;
        tracing::info!("Connected to task store");
        Ok(db)
    }
}
