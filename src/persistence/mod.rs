//! Generic persistence engine.
//!
//! # Data Flow
//! ```text
//! Domain repository ──▶ CrudRepository<T, ID> ──▶ ConnectionProvider::acquire
//!                            │                           │
//!                            │ EntityMapping callbacks   ▼
//!                            └──────────────────▶ rusqlite::Connection (dropped per call)
//! ```
//!
//! # Design Decisions
//! - Entity-specific knowledge lives only in the mapping
//! - No caching, pooling or transactions

pub mod error;
pub mod mapping;
pub mod provider;
pub mod repository;

pub use error::{PersistenceError, PersistenceResult};
pub use mapping::EntityMapping;
pub use provider::{ConnectionProvider, SqliteConnectionProvider};
pub use repository::CrudRepository;
