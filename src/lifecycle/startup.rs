//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the database provider and ensure the users table exists
//! - Build repositories and controllers
//! - Register every handler with the dispatcher
//! - Assemble the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The dispatcher is frozen behind an `Arc` before the server sees it

use std::sync::Arc;

use thiserror::Error;

use crate::config::{AppConfig, DatabaseConfig};
use crate::http::server::{HttpServer, ServerError};
use crate::persistence::{ConnectionProvider, PersistenceError, SqliteConnectionProvider};
use crate::routing::dispatcher::{Dispatcher, RegistrationError};
use crate::users::{SqliteUserRepository, UserController};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database setup failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("handler registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("server setup failed: {0}")]
    Server(#[from] ServerError),
}

/// Build the dispatcher over the configured SQLite database.
pub fn build_dispatcher(config: &DatabaseConfig) -> Result<Dispatcher, StartupError> {
    let provider: Arc<dyn ConnectionProvider> = Arc::new(SqliteConnectionProvider::from_config(config));
    build_dispatcher_with(provider, config)
}

/// Build the dispatcher over an explicit connection provider.
pub fn build_dispatcher_with(
    provider: Arc<dyn ConnectionProvider>,
    config: &DatabaseConfig,
) -> Result<Dispatcher, StartupError> {
    let users = SqliteUserRepository::with_table(provider, config.users_table.clone())?;
    if config.initialize_schema {
        users.ensure_schema()?;
    }

    let mut dispatcher = Dispatcher::new();
    let added = dispatcher.register(Arc::new(UserController::new(Arc::new(users))))?;
    tracing::info!(
        operations = added,
        users_table = %config.users_table,
        "Handlers registered"
    );
    Ok(dispatcher)
}

/// Wire the whole service from configuration.
pub fn build_server(config: AppConfig) -> Result<HttpServer, StartupError> {
    let dispatcher = build_dispatcher(&config.database)?;
    Ok(HttpServer::new(config, Arc::new(dispatcher))?)
}
