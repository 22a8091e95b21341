//! Operation registration and lookup.
//!
//! # Responsibilities
//! - Collect the operations a handler exposes (its registration table)
//! - Compile each into an immutable `RouteDescriptor`
//! - Resolve `(method, path)` to the operation that serves it
//!
//! # Design Decisions
//! - Registration happens once at startup; the dispatcher is read-only afterwards
//!   and shared via `Arc` without locks
//! - Resolution is a linear first-match scan in registration order
//! - Overlapping templates (`/{id}` vs `/new`) are not detected; the earlier
//!   registration wins
//! - No match is an ordinary outcome (`Resolution::NotFound`), not an error

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::error::ApiError;
use crate::http::binder::Arguments;
use crate::http::response::Reply;
use crate::routing::descriptor::{ParamBinding, RouteDescriptor, TargetType};
use crate::routing::matcher::{PathTemplate, TemplateError};

/// Callable body of an operation.
pub type Operation = Arc<dyn Fn(Arguments) -> Result<Reply, ApiError> + Send + Sync>;

/// Errors detected while registering a handler.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("operation '{operation}': {source}")]
    Template {
        operation: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("duplicate route {method} {template} (operation '{operation}')")]
    Duplicate {
        operation: &'static str,
        method: Method,
        template: String,
    },

    #[error("operation '{operation}' binds path variable '{name}' which its template does not declare")]
    UnknownPathVariable { operation: &'static str, name: String },

    #[error("operation '{operation}' binds path variable '{name}' to a record type")]
    RecordPathVariable { operation: &'static str, name: String },

    #[error("operation '{operation}' declares more than one request body")]
    MultipleBodies { operation: &'static str },
}

/// One entry of a handler's registration table.
pub struct OperationSpec {
    name: &'static str,
    method: Method,
    template: String,
    bindings: Vec<ParamBinding>,
    invoke: Operation,
}

impl OperationSpec {
    pub fn new<F>(name: &'static str, method: Method, template: &str, invoke: F) -> Self
    where
        F: Fn(Arguments) -> Result<Reply, ApiError> + Send + Sync + 'static,
    {
        Self {
            name,
            method,
            template: template.to_string(),
            bindings: Vec::new(),
            invoke: Arc::new(invoke),
        }
    }

    pub fn get<F>(name: &'static str, template: &str, invoke: F) -> Self
    where
        F: Fn(Arguments) -> Result<Reply, ApiError> + Send + Sync + 'static,
    {
        Self::new(name, Method::GET, template, invoke)
    }

    pub fn post<F>(name: &'static str, template: &str, invoke: F) -> Self
    where
        F: Fn(Arguments) -> Result<Reply, ApiError> + Send + Sync + 'static,
    {
        Self::new(name, Method::POST, template, invoke)
    }

    pub fn put<F>(name: &'static str, template: &str, invoke: F) -> Self
    where
        F: Fn(Arguments) -> Result<Reply, ApiError> + Send + Sync + 'static,
    {
        Self::new(name, Method::PUT, template, invoke)
    }

    pub fn delete<F>(name: &'static str, template: &str, invoke: F) -> Self
    where
        F: Fn(Arguments) -> Result<Reply, ApiError> + Send + Sync + 'static,
    {
        Self::new(name, Method::DELETE, template, invoke)
    }

    /// Append the binding for the next parameter.
    pub fn bind(mut self, binding: ParamBinding) -> Self {
        self.bindings.push(binding);
        self
    }
}

impl fmt::Debug for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationSpec")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("template", &self.template)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// An object exposing routable operations.
pub trait Handler: Send + Sync + 'static {
    /// Prefix shared by every operation template of this handler.
    fn base_path(&self) -> &str {
        ""
    }

    /// The handler's registration table.
    fn operations(self: Arc<Self>) -> Vec<OperationSpec>;
}

struct RegisteredOperation {
    name: &'static str,
    descriptor: RouteDescriptor,
    invoke: Operation,
}

/// Cheap, cloneable reference to a registered operation.
#[derive(Clone)]
pub struct OperationHandle(Arc<RegisteredOperation>);

impl OperationHandle {
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn descriptor(&self) -> &RouteDescriptor {
        &self.0.descriptor
    }

    /// Run the operation with already-bound arguments.
    pub fn invoke(&self, args: Arguments) -> Result<Reply, ApiError> {
        (self.0.invoke)(args)
    }
}

impl fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("name", &self.0.name)
            .field("route", &self.0.descriptor.to_string())
            .finish()
    }
}

/// Outcome of resolving a request.
#[derive(Debug, Clone)]
pub enum Resolution {
    Matched(OperationHandle),
    NotFound,
}

/// Registry of every operation across all handlers.
#[derive(Default)]
pub struct Dispatcher {
    operations: Vec<OperationHandle>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every operation a handler exposes.
    ///
    /// Nothing is registered if any operation of the handler is invalid.
    /// Returns the number of operations added.
    pub fn register<H: Handler>(&mut self, handler: Arc<H>) -> Result<usize, RegistrationError> {
        let base_path = normalize_base(handler.base_path());
        let specs = handler.operations();
        let mut compiled: Vec<OperationHandle> = Vec::with_capacity(specs.len());

        for spec in specs {
            let template =
                PathTemplate::compile(&spec.template).map_err(|source| RegistrationError::Template {
                    operation: spec.name,
                    source,
                })?;

            validate_bindings(spec.name, &template, &spec.bindings)?;

            let duplicate = compiled.iter().any(|op| {
                *op.descriptor().method() == spec.method
                    && op.descriptor().template().same_shape(&template)
            });
            if duplicate {
                return Err(RegistrationError::Duplicate {
                    operation: spec.name,
                    method: spec.method,
                    template: spec.template,
                });
            }

            let descriptor =
                RouteDescriptor::new(spec.method, base_path.clone(), template, spec.bindings);
            compiled.push(OperationHandle(Arc::new(RegisteredOperation {
                name: spec.name,
                descriptor,
                invoke: spec.invoke,
            })));
        }

        let added = compiled.len();
        for op in &compiled {
            tracing::debug!(
                operation = op.name(),
                route = %op.descriptor(),
                "Registered operation"
            );
        }
        self.operations.extend(compiled);
        Ok(added)
    }

    /// Find the operation serving `method` + `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution {
        self.operations
            .iter()
            .filter(|op| op.descriptor().method() == method)
            .find(|op| op.descriptor().match_path(path).is_some())
            .cloned()
            .map_or(Resolution::NotFound, Resolution::Matched)
    }

    /// Methods registered for templates that structurally match `path`.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for op in &self.operations {
            let method = op.descriptor().method();
            if !methods.contains(method) && op.descriptor().match_path(path).is_some() {
                methods.push(method.clone());
            }
        }
        methods
    }

    /// All registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.operations.iter().map(|op| op.descriptor())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn validate_bindings(
    operation: &'static str,
    template: &PathTemplate,
    bindings: &[ParamBinding],
) -> Result<(), RegistrationError> {
    let mut bodies = 0;
    for binding in bindings {
        match binding {
            ParamBinding::PathVariable { name, target } => {
                if !template.has_placeholder(name) {
                    return Err(RegistrationError::UnknownPathVariable {
                        operation,
                        name: name.clone(),
                    });
                }
                if matches!(target, TargetType::Record(_)) {
                    return Err(RegistrationError::RecordPathVariable {
                        operation,
                        name: name.clone(),
                    });
                }
            }
            ParamBinding::RequestBody { .. } => bodies += 1,
            ParamBinding::Unbound => {}
        }
    }
    if bodies > 1 {
        return Err(RegistrationError::MultipleBodies { operation });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::Payload;

    struct Echo;

    impl Handler for Echo {
        fn base_path(&self) -> &str {
            "/api/items"
        }

        fn operations(self: Arc<Self>) -> Vec<OperationSpec> {
            vec![
                OperationSpec::get("list", "", |_| Ok(Reply::new(Payload::text("list")))),
                OperationSpec::get("by_id", "/{id}", |_| Ok(Reply::new(Payload::text("by_id"))))
                    .bind(ParamBinding::path("id", TargetType::LongInteger)),
                OperationSpec::get("fresh", "/new", |_| Ok(Reply::new(Payload::text("fresh")))),
                OperationSpec::post("create", "", |_| Ok(Reply::new(Payload::text("create")))),
            ]
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut d = Dispatcher::new();
        d.register(Arc::new(Echo)).unwrap();
        d
    }

    fn resolved_name(d: &Dispatcher, method: Method, path: &str) -> Option<&'static str> {
        match d.resolve(&method, path) {
            Resolution::Matched(op) => Some(op.name()),
            Resolution::NotFound => None,
        }
    }

    #[test]
    fn test_resolve_each_registered_route() {
        let d = dispatcher();
        assert_eq!(d.len(), 4);
        assert_eq!(resolved_name(&d, Method::GET, "/api/items"), Some("list"));
        assert_eq!(resolved_name(&d, Method::GET, "/api/items/"), Some("list"));
        assert_eq!(resolved_name(&d, Method::GET, "/api/items/3"), Some("by_id"));
        assert_eq!(resolved_name(&d, Method::POST, "/api/items"), Some("create"));
    }

    #[test]
    fn test_other_verb_is_not_found() {
        let d = dispatcher();
        assert_eq!(resolved_name(&d, Method::DELETE, "/api/items"), None);
        assert_eq!(resolved_name(&d, Method::POST, "/api/items/3"), None);
        assert_eq!(resolved_name(&d, Method::GET, "/api/other"), None);
        assert_eq!(resolved_name(&d, Method::GET, "/api/itemsx"), None);
    }

    #[test]
    fn test_overlap_resolves_in_registration_order() {
        let d = dispatcher();
        // `/{id}` was registered before `/new`
        assert_eq!(resolved_name(&d, Method::GET, "/api/items/new"), Some("by_id"));
    }

    #[test]
    fn test_allowed_methods() {
        let d = dispatcher();
        assert_eq!(d.allowed_methods("/api/items"), vec![Method::GET, Method::POST]);
        assert_eq!(d.allowed_methods("/api/items/3"), vec![Method::GET]);
        assert!(d.allowed_methods("/nope").is_empty());
    }

    struct Table(std::sync::Mutex<Vec<OperationSpec>>);

    impl Handler for Table {
        fn operations(self: Arc<Self>) -> Vec<OperationSpec> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn table(specs: Vec<OperationSpec>) -> Arc<Table> {
        Arc::new(Table(std::sync::Mutex::new(specs)))
    }

    fn ok_reply(_: Arguments) -> Result<Reply, ApiError> {
        Ok(Reply::new(Payload::Absent))
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut d = Dispatcher::new();
        let err = d
            .register(table(vec![
                OperationSpec::get("a", "/x", ok_reply),
                OperationSpec::get("b", "/x", ok_reply),
            ]))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Duplicate { operation: "b", .. }));
        assert!(d.is_empty());
    }

    #[test]
    fn test_duplicate_detected_across_spellings() {
        let mut d = Dispatcher::new();
        let err = d
            .register(table(vec![
                OperationSpec::get("a", "/x", ok_reply),
                OperationSpec::get("b", "x", ok_reply),
            ]))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Duplicate { operation: "b", .. }));

        let err = d
            .register(table(vec![
                OperationSpec::get("a", "/{id}", ok_reply),
                OperationSpec::get("b", "/{key}", ok_reply),
            ]))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Duplicate { operation: "b", .. }));
        assert!(d.is_empty());
    }

    #[test]
    fn test_same_template_different_verbs_allowed() {
        let mut d = Dispatcher::new();
        let added = d
            .register(table(vec![
                OperationSpec::get("a", "/x", ok_reply),
                OperationSpec::post("b", "/x", ok_reply),
            ]))
            .unwrap();
        assert_eq!(added, 2);
    }

    #[test]
    fn test_unknown_path_variable_rejected() {
        let mut d = Dispatcher::new();
        let err = d
            .register(table(vec![OperationSpec::get("a", "/{id}", ok_reply)
                .bind(ParamBinding::path("name", TargetType::Text))]))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::UnknownPathVariable { .. }));
    }

    #[test]
    fn test_multiple_bodies_rejected() {
        let mut d = Dispatcher::new();
        let err = d
            .register(table(vec![OperationSpec::post("a", "", ok_reply)
                .bind(ParamBinding::body(TargetType::Text))
                .bind(ParamBinding::body(TargetType::Text))]))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MultipleBodies { operation: "a" }));
    }

    #[test]
    fn test_bad_template_rejected() {
        let mut d = Dispatcher::new();
        let err = d
            .register(table(vec![OperationSpec::get("a", "/{id", ok_reply)]))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Template { operation: "a", .. }));
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base(""), "");
        assert_eq!(normalize_base("/"), "");
        assert_eq!(normalize_base("/api/users/"), "/api/users");
        assert_eq!(normalize_base("api"), "/api");
    }
}
