//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, CORS/content-type headers)
//!     → OPTIONS? → 200, empty body
//!     → Dispatcher::resolve (404 / 405 on miss)
//!     → blocking pool: binder.rs (path vars + record.rs body) → operation
//!     → response.rs (JSON payload or error envelope)
//!     → Send to client
//! ```

pub mod binder;
pub mod record;
pub mod request;
pub mod response;
pub mod server;

pub use binder::{Argument, ArgumentBinder, Arguments, BindingError};
pub use record::{decode, decode_record, FlatRecord, Record};
pub use request::X_REQUEST_ID;
pub use response::{Payload, Reply, ResponseEncoder};
pub use server::HttpServer;
