//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     Handler::operations() (registration table)
//!     → matcher.rs (compile templates)
//!     → descriptor.rs (RouteDescriptor per operation)
//!     → dispatcher.rs (validated, frozen list)
//!
//! Incoming Request (method, path)
//!     → dispatcher.rs (filter by method, first template match)
//!     → Return: Matched(OperationHandle) or NotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same operation
//! - First match wins (registration order)

pub mod descriptor;
pub mod dispatcher;
pub mod matcher;

pub use descriptor::{FieldSpec, ParamBinding, RecordShape, RouteDescriptor, ScalarKind, TargetType};
pub use dispatcher::{Dispatcher, Handler, Operation, OperationHandle, OperationSpec, RegistrationError, Resolution};
pub use matcher::{PathParams, PathTemplate, TemplateError};
