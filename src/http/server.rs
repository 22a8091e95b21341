//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single dispatching fallback
//! - Wire up middleware (request ID, tracing, CORS and content-type headers)
//! - Answer `OPTIONS` before any dispatch
//! - Resolve, bind and invoke operations on the blocking pool
//! - Map every outcome to a status and JSON body
//! - Record request metrics
//!
//! # Design Decisions
//! - All routing is done by the `Dispatcher`; Axum only supplies the socket
//!   and the middleware stack
//! - Operations run inside `spawn_blocking` because database work is synchronous
//! - Response headers are set with overriding layers so every response,
//!   including errors and `OPTIONS`, carries the same headers
//! - The body limit is enforced while reading the body, so an oversize
//!   request gets the same 413 envelope whether or not it declares a
//!   Content-Length

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::config::{AppConfig, CorsConfig};
use crate::error::ApiError;
use crate::http::binder::{ArgumentBinder, BindingError};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::{Reply, ResponseEncoder};
use crate::observability::metrics;
use crate::routing::dispatcher::{Dispatcher, OperationHandle, Resolution};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid value for header {name}: '{value}'")]
    InvalidHeader { name: &'static str, value: String },
}

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    binder: ArgumentBinder,
    encoder: ResponseEncoder,
    max_body_size: usize,
}

/// HTTP server for the user service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server that dispatches through `dispatcher`.
    pub fn new(config: AppConfig, dispatcher: Arc<Dispatcher>) -> Result<Self, ServerError> {
        let state = AppState {
            dispatcher,
            binder: ArgumentBinder::new(),
            encoder: ResponseEncoder::new(),
            max_body_size: config.server.max_body_size,
        };
        let router = Self::build_router(&config, state)?;
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Result<Router, ServerError> {
        let headers = response_headers(&config.cors)?;

        let mut router = Router::new().fallback(dispatch).with_state(state).layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(
                    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            path = %req.uri().path(),
                            request_id = %request_id(req.headers()),
                        )
                    }),
                )
                .layer(propagate_request_id_layer()),
        );
        for (name, value) in headers {
            router = router.layer(SetResponseHeaderLayer::overriding(name, value));
        }
        Ok(router)
    }

    /// A clone of the fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_body_size = self.config.server.max_body_size,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn response_headers(cors: &CorsConfig) -> Result<Vec<(HeaderName, HeaderValue)>, ServerError> {
    let entry = |name: HeaderName, label: &'static str, value: &str| {
        HeaderValue::from_str(value)
            .map(|v| (name, v))
            .map_err(|_| ServerError::InvalidHeader {
                name: label,
                value: value.to_string(),
            })
    };

    Ok(vec![
        (header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE)),
        entry(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            "Access-Control-Allow-Origin",
            &cors.allow_origin,
        )?,
        entry(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            "Access-Control-Allow-Methods",
            &cors.allow_methods,
        )?,
        entry(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Access-Control-Allow-Headers",
            &cors.allow_headers,
        )?,
    ])
}

/// Single entry point for every request.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if method == Method::OPTIONS {
        metrics::record_request(method.as_str(), 200, "preflight", start);
        return StatusCode::OK.into_response();
    }

    let operation = match state.dispatcher.resolve(&method, &path) {
        Resolution::Matched(op) => op,
        Resolution::NotFound => return state.reject_unmatched(&method, &path, start),
    };
    let route = operation.descriptor().to_string();

    tracing::debug!(operation = operation.name(), route = %route, "Dispatching request");

    let body = match read_body(request, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(err) => return state.fail(&method, &route, operation.name(), &err, start),
    };

    match invoke(state.binder, operation.clone(), path, body).await {
        Ok(reply) => {
            let (status, bytes) = state.encoder.encode(&method, &reply);
            tracing::debug!(operation = operation.name(), status = status.as_u16(), "Request completed");
            metrics::record_request(method.as_str(), status.as_u16(), &route, start);
            (status, bytes).into_response()
        }
        Err(err) => state.fail(&method, &route, operation.name(), &err, start),
    }
}

/// Collect the request body, failing with `PayloadTooLarge` once it
/// exceeds `limit` bytes.
async fn read_body(request: Request<Body>, limit: usize) -> Result<Bytes, ApiError> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(ApiError::PayloadTooLarge);
    }

    let mut body = request.into_body();
    let mut collected = Vec::new();
    while let Some(frame) = std::future::poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await {
        let frame = frame.map_err(|e| BindingError::Body {
            message: format!("failed to read request body: {}", e),
        })?;
        if let Ok(data) = frame.into_data() {
            if collected.len() + data.len() > limit {
                return Err(ApiError::PayloadTooLarge);
            }
            collected.extend_from_slice(&data);
        }
    }
    Ok(Bytes::from(collected))
}

/// Bind and run an operation on the blocking pool.
async fn invoke(
    binder: ArgumentBinder,
    operation: OperationHandle,
    path: String,
    body: Bytes,
) -> Result<Reply, ApiError> {
    let name = operation.name();
    tokio::task::spawn_blocking(move || -> Result<Reply, ApiError> {
        let args = binder.bind(&operation, &path, &body)?;
        operation.invoke(args)
    })
    .await
    .map_err(|e| ApiError::Unknown(format!("operation '{}' did not complete: {}", name, e)))?
}

impl AppState {
    fn reject_unmatched(&self, method: &Method, path: &str, start: Instant) -> Response {
        let allowed = self.dispatcher.allowed_methods(path);
        let err = if allowed.is_empty() {
            ApiError::NotFound
        } else {
            ApiError::MethodNotAllowed
        };
        tracing::warn!(method = %method, path = %path, status = err.status().as_u16(), "No operation matched");
        metrics::record_request(method.as_str(), err.status().as_u16(), "none", start);

        let (status, bytes) = self.encoder.encode_api_error(&err);
        let mut response = (status, bytes).into_response();
        if !allowed.is_empty() {
            let list = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&list) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }

    fn fail(
        &self,
        method: &Method,
        route: &str,
        operation: &'static str,
        err: &ApiError,
        start: Instant,
    ) -> Response {
        let (status, bytes) = self.encoder.encode_api_error(err);
        if status.is_server_error() {
            tracing::error!(operation, route = %route, error = %err, "Operation failed");
            metrics::record_operation_failure(operation);
        } else {
            tracing::warn!(operation, route = %route, error = %err, "Request rejected");
        }
        metrics::record_request(method.as_str(), status.as_u16(), route, start);
        (status, bytes).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_headers_from_config() {
        let headers = response_headers(&CorsConfig::default()).unwrap();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers[0].1, JSON_CONTENT_TYPE);
        assert_eq!(headers[1].1, "*");
    }

    fn request_with(body: &'static str, content_length: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri("/api/users");
        if let Some(len) = content_length {
            builder = builder.header(header::CONTENT_LENGTH, len);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let bytes = read_body(request_with(r#"{"a":1}"#, None), 16).await.unwrap();
        assert_eq!(&bytes[..], br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_read_body_over_limit_same_error_with_or_without_length() {
        let body = r#"{"name":"a long enough name"}"#;
        let declared = read_body(request_with(body, Some("29")), 16).await;
        let streamed = read_body(request_with(body, None), 16).await;
        assert!(matches!(declared, Err(ApiError::PayloadTooLarge)));
        assert!(matches!(streamed, Err(ApiError::PayloadTooLarge)));
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let cors = CorsConfig {
            allow_origin: "bad\nvalue".into(),
            ..CorsConfig::default()
        };
        assert!(matches!(
            response_headers(&cors),
            Err(ServerError::InvalidHeader { name: "Access-Control-Allow-Origin", .. })
        ));
    }
}
