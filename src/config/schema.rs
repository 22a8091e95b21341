//! Configuration schema definitions.
//!
//! Every section and field has a default, so an empty file (or no file)
//! yields a runnable service.

use serde::{Deserialize, Serialize};

/// Root configuration for the user service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and worker settings.
    pub server: ServerConfig,

    /// Database location and schema handling.
    pub database: DatabaseConfig,

    /// Values of the CORS headers added to every response.
    pub cors: CorsConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Async worker threads. Defaults to `max(4, cores * 2)`.
    pub worker_threads: Option<usize>,

    /// Threads available to blocking operation work. Defaults like `worker_threads`.
    pub max_blocking_threads: Option<usize>,

    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            worker_threads: None,
            max_blocking_threads: None,
            max_body_size: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(default_pool_size)
    }

    pub fn effective_blocking_threads(&self) -> usize {
        self.max_blocking_threads.unwrap_or_else(default_pool_size)
    }
}

fn default_pool_size() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores * 2).max(4)
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: String,

    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Table holding users.
    pub users_table: String,

    /// Create the users table at startup when missing.
    pub initialize_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "users.db".to_string(),
            busy_timeout_ms: 5_000,
            users_table: "users".to_string(),
            initialize_schema: true,
        }
    }
}

/// CORS header values.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, OPTIONS".to_string(),
            allow_headers: "Content-Type".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,

    /// Start the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert!(config.database.initialize_schema);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_cors_defaults() {
        let cors = CorsConfig::default();
        assert_eq!(cors.allow_origin, "*");
        assert_eq!(cors.allow_methods, "GET, POST, PUT, DELETE, OPTIONS");
        assert_eq!(cors.allow_headers, "Content-Type");
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"
            worker_threads = 2

            [database]
            users_table = "members"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.server.effective_worker_threads(), 2);
        assert_eq!(config.server.max_body_size, 1024 * 1024);
        assert_eq!(config.database.users_table, "members");
        assert_eq!(config.database.path, "users.db");
    }

    #[test]
    fn test_default_pool_size_floor() {
        assert!(ServerConfig::default().effective_blocking_threads() >= 4);
    }
}
