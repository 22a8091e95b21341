//! Argument binding for matched operations.
//!
//! # Responsibilities
//! - Re-match the request path against the operation's template
//! - Coerce path captures to their declared scalar types
//! - Decode the request body into the declared record shape
//! - Hand the operation an ordered, typed argument list
//!
//! # Design Decisions
//! - Binding never applies business rules; operations validate after binding
//! - Any malformed input is a `BindingError` (400 at the boundary)

use crate::error::ApiError;
use crate::http::record::{decode_record, FlatRecord, Record};
use crate::routing::descriptor::{ParamBinding, ScalarKind, TargetType};
use crate::routing::dispatcher::OperationHandle;

/// Malformed request input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("invalid value '{value}' for path variable '{name}': expected {expected}")]
    PathVariable {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("path does not match route {route}")]
    PathMismatch { route: String },

    #[error("path variable '{0}' was not captured")]
    MissingPathVariable(String),

    #[error("invalid value for field '{field}': expected {expected}")]
    Field { field: String, expected: &'static str },

    #[error("{message}")]
    Body { message: String },
}

/// One bound argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Integer(i32),
    LongInteger(i64),
    Text(String),
    Record(Record),
    Unbound,
}

/// Ordered arguments for one operation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    pub fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    pub fn integer(&self, index: usize) -> Result<i32, ApiError> {
        match self.values.get(index) {
            Some(Argument::Integer(n)) => Ok(*n),
            other => Err(mismatch(index, "integer", other)),
        }
    }

    pub fn long(&self, index: usize) -> Result<i64, ApiError> {
        match self.values.get(index) {
            Some(Argument::LongInteger(n)) => Ok(*n),
            other => Err(mismatch(index, "long integer", other)),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str, ApiError> {
        match self.values.get(index) {
            Some(Argument::Text(s)) => Ok(s),
            other => Err(mismatch(index, "string", other)),
        }
    }

    /// Take a bound record as its concrete type.
    pub fn record<T: FlatRecord>(&self, index: usize) -> Result<T, ApiError> {
        match self.values.get(index) {
            Some(Argument::Record(record)) => Ok(record.clone().into_typed()?),
            other => Err(mismatch(index, T::SHAPE.name, other)),
        }
    }
}

fn mismatch(index: usize, wanted: &str, found: Option<&Argument>) -> ApiError {
    ApiError::Unknown(format!(
        "argument {} is not a {} (found {:?})",
        index, wanted, found
    ))
}

/// Builds argument lists from raw request parts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentBinder;

impl ArgumentBinder {
    pub fn new() -> Self {
        Self
    }

    /// Bind every declared parameter of `operation` in order.
    pub fn bind(
        &self,
        operation: &OperationHandle,
        raw_path: &str,
        raw_body: &[u8],
    ) -> Result<Arguments, BindingError> {
        let descriptor = operation.descriptor();
        let mut captures = None;
        let mut values = Vec::with_capacity(descriptor.bindings().len());

        for binding in descriptor.bindings() {
            let value = match binding {
                ParamBinding::PathVariable { name, target } => {
                    if captures.is_none() {
                        captures = Some(descriptor.match_path(raw_path).ok_or_else(|| {
                            BindingError::PathMismatch {
                                route: descriptor.to_string(),
                            }
                        })?);
                    }
                    let raw = captures
                        .as_ref()
                        .and_then(|c| c.get(name))
                        .ok_or_else(|| BindingError::MissingPathVariable(name.clone()))?;
                    coerce_path_variable(name, raw, *target)?
                }
                ParamBinding::RequestBody { target } => bind_body(*target, raw_body)?,
                ParamBinding::Unbound => Argument::Unbound,
            };
            values.push(value);
        }

        Ok(Arguments::new(values))
    }
}

fn coerce_path_variable(name: &str, raw: &str, target: TargetType) -> Result<Argument, BindingError> {
    let invalid = |expected: &'static str| BindingError::PathVariable {
        name: name.to_string(),
        value: raw.to_string(),
        expected,
    };

    match target.scalar() {
        Some(ScalarKind::Integer) => raw
            .parse()
            .map(Argument::Integer)
            .map_err(|_| invalid(ScalarKind::Integer.name())),
        Some(ScalarKind::LongInteger) => raw
            .parse()
            .map(Argument::LongInteger)
            .map_err(|_| invalid(ScalarKind::LongInteger.name())),
        Some(ScalarKind::Text) => Ok(Argument::Text(raw.to_string())),
        // Record path variables never pass registration.
        None => Err(invalid("scalar")),
    }
}

fn bind_body(target: TargetType, raw: &[u8]) -> Result<Argument, BindingError> {
    if let TargetType::Record(shape) = target {
        return decode_record(shape, raw).map(Argument::Record);
    }

    let text = std::str::from_utf8(raw).map_err(|_| BindingError::Body {
        message: "request body is not valid UTF-8".to_string(),
    })?;
    let invalid = |expected: &'static str| BindingError::Body {
        message: format!("request body must be a {}", expected),
    };

    match target.scalar() {
        Some(ScalarKind::Integer) => text
            .trim()
            .parse()
            .map(Argument::Integer)
            .map_err(|_| invalid(ScalarKind::Integer.name())),
        Some(ScalarKind::LongInteger) => text
            .trim()
            .parse()
            .map(Argument::LongInteger)
            .map_err(|_| invalid(ScalarKind::LongInteger.name())),
        _ => Ok(Argument::Text(text.to_string())),
    }
}
