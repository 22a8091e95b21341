//! Route descriptors and parameter bindings.
//!
//! A descriptor is the compiled, immutable record of one operation:
//! its verb, its template (relative to the handler's base path) and the
//! ordered list of bindings that tell the binder how to build each argument.

use std::fmt;

use axum::http::Method;

use crate::routing::matcher::{PathParams, PathTemplate};

/// Scalar value kinds a flat record field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    LongInteger,
    /// UTF-8 string.
    Text,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Integer => "integer",
            ScalarKind::LongInteger => "long integer",
            ScalarKind::Text => "string",
        }
    }
}

/// One declared field of a flat record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: ScalarKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: ScalarKind) -> Self {
        Self { name, kind }
    }
}

/// The declared shape of a domain record accepted as a request body.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Type an argument is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Integer,
    LongInteger,
    Text,
    Record(&'static RecordShape),
}

impl TargetType {
    /// The scalar kind of this target, or `None` for records.
    pub fn scalar(self) -> Option<ScalarKind> {
        match self {
            TargetType::Integer => Some(ScalarKind::Integer),
            TargetType::LongInteger => Some(ScalarKind::LongInteger),
            TargetType::Text => Some(ScalarKind::Text),
            TargetType::Record(_) => None,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Record(shape) => write!(f, "record {}", shape.name),
            other => match other.scalar() {
                Some(kind) => write!(f, "{}", kind.name()),
                None => Ok(()),
            },
        }
    }
}

/// How one operation parameter is filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    /// Captured from the named placeholder in the route template.
    PathVariable { name: String, target: TargetType },
    /// Decoded from the request payload.
    RequestBody { target: TargetType },
    /// Nothing supplies a value.
    Unbound,
}

impl ParamBinding {
    pub fn path(name: impl Into<String>, target: TargetType) -> Self {
        ParamBinding::PathVariable {
            name: name.into(),
            target,
        }
    }

    pub fn body(target: TargetType) -> Self {
        ParamBinding::RequestBody { target }
    }
}

/// Compiled route of a registered operation.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    method: Method,
    base_path: String,
    template: PathTemplate,
    bindings: Vec<ParamBinding>,
}

impl RouteDescriptor {
    pub(crate) fn new(
        method: Method,
        base_path: String,
        template: PathTemplate,
        bindings: Vec<ParamBinding>,
    ) -> Self {
        Self {
            method,
            base_path,
            template,
            bindings,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }

    /// Strip the handler base path from a request path.
    ///
    /// The base only matches at a segment boundary, so `/api/usersx`
    /// is not under `/api/users`.
    pub fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        strip_base(&self.base_path, path)
    }

    /// Match a full request path (base path included).
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        self.relative(path).and_then(|rel| self.template.matches(rel))
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.method, self.base_path, self.template.as_str())
    }
}

pub(crate) fn strip_base<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() || rest.starts_with('/') || base.ends_with('/') {
        Some(rest)
    } else {
        None
    }
}
