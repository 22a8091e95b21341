//! Error taxonomy shared by the routing core and the boundary.
//!
//! # Mapping
//! ```text
//! RoutingError      → 404   no operation matches (verb, path)
//! MethodNotAllowed  → 405   path matches, verb does not
//! BindingError      → 400   malformed path variable or body
//! PayloadTooLarge   → 413   body exceeds the configured limit
//! ValidationError   → 400   business rule violated inside an operation
//! PersistenceError  → 500   statement, connection or affected-row failure
//! UnknownFault      → 500   anything else
//! ```

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::binder::BindingError;
use crate::persistence::PersistenceError;

/// Category of a failure, independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Routing,
    MethodNotAllowed,
    Binding,
    PayloadTooLarge,
    Validation,
    Persistence,
    Unknown,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Routing => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::Binding | ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Persistence | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors that can end a request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("Payload Too Large")]
    PayloadTooLarge,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound => ErrorKind::Routing,
            ApiError::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            ApiError::Binding(_) => ErrorKind::Binding,
            ApiError::PayloadTooLarge => ErrorKind::PayloadTooLarge,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Persistence(_) => ErrorKind::Persistence,
            ApiError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// Message placed in the error envelope.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Persistence | ErrorKind::Unknown => {
                format!("Internal Server Error: {}", self)
            }
            _ => self.to_string(),
        }
    }
}
