//! Database connection providers.
//!
//! # Responsibilities
//! - Hand out a fresh, scoped connection per engine call
//! - Apply per-connection settings (busy timeout)
//!
//! # Design Decisions
//! - No pooling: each call opens its own connection and drops it on every exit path
//! - Providers are shared read-only across workers (`Send + Sync`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::config::DatabaseConfig;
use crate::persistence::error::{PersistenceError, PersistenceResult};

/// Source of database connections for the CRUD engine.
pub trait ConnectionProvider: Send + Sync {
    /// Open a connection. It closes when dropped.
    fn acquire(&self) -> PersistenceResult<Connection>;
}

/// Opens a new SQLite connection to a database file for every call.
#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    path: PathBuf,
    busy_timeout: Duration,
    flags: OpenFlags,
}

impl SqliteConnectionProvider {
    /// Provider for the database file at `path`, creating it if needed.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_millis(5_000),
            flags: OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(&config.path).with_busy_timeout(Duration::from_millis(config.busy_timeout_ms))
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    fn acquire(&self) -> PersistenceResult<Connection> {
        let conn = Connection::open_with_flags(&self.path, self.flags)
            .map_err(|source| PersistenceError::Connection { source })?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|source| PersistenceError::Connection { source })?;
        tracing::trace!(path = %self.path.display(), "Database connection opened");
        Ok(conn)
    }
}
