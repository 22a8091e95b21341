//! User Service
//!
//! A small JSON-over-HTTP user service built on a table-driven routing core
//! and a generic SQLite CRUD engine.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request       ┌──────────────────────────────────────────────────────┐
//!     ─────────────────────┼─▶ http::server ──▶ routing::dispatcher ──▶ http::binder│
//!                          │   (axum, layers)    (method + template)   (path, body) │
//!                          │                                              │         │
//!                          │                                              ▼         │
//!                          │                                     users::controller  │
//!                          │                                              │         │
//!                          │                                              ▼         │
//!     Client Response      │   http::response ◀── Reply      persistence::CrudRepository
//!     ◀────────────────────┼── (JSON / error)                   (EntityMapping + rusqlite)
//!                          │                                                        │
//!                          │   Cross-cutting: config · observability · lifecycle    │
//!                          └──────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod error;
pub mod http;
pub mod persistence;
pub mod routing;

// Resources
pub mod products;
pub mod users;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use error::{ApiError, ErrorKind};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
