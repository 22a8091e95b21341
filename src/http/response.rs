//! Response encoding.
//!
//! # Responsibilities
//! - Turn operation results into JSON payload bytes
//! - Pick the success status (201 for POST, 200 otherwise, unless overridden)
//! - Wrap every failure in the uniform `{"error": message}` envelope
//!
//! # Design Decisions
//! - Records encode as flat objects in field declaration order
//! - Collections encode as arrays; an absent optional encodes as `null`
//! - String escaping is left to `serde_json`, so output is always well-formed

use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ErrorKind};

/// A value returned by an operation, ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Record(Map<String, Value>),
    Collection(Vec<Payload>),
    Absent,
    Scalar(Value),
}

impl Payload {
    /// Encode a single record; it must serialize to a JSON object.
    pub fn record<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Payload::Record(map)),
            Ok(other) => Err(ApiError::Unknown(format!(
                "record serialized to non-object value {}",
                other
            ))),
            Err(e) => Err(ApiError::Unknown(format!("record serialization failed: {}", e))),
        }
    }

    /// Encode a present record, or `null` when absent.
    pub fn optional<T: Serialize>(value: Option<&T>) -> Result<Self, ApiError> {
        match value {
            Some(v) => Self::record(v),
            None => Ok(Payload::Absent),
        }
    }

    /// Encode an ordered sequence of records.
    pub fn collection<'a, T, I>(items: I) -> Result<Self, ApiError>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        items
            .into_iter()
            .map(Self::record)
            .collect::<Result<Vec<_>, _>>()
            .map(Payload::Collection)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Payload::Scalar(Value::String(value.into()))
    }

    fn to_value(&self) -> Value {
        match self {
            Payload::Record(map) => Value::Object(map.clone()),
            Payload::Collection(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            Payload::Absent => Value::Null,
            Payload::Scalar(value) => value.clone(),
        }
    }
}

/// Operation result plus an optional explicit status.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: Option<StatusCode>,
    payload: Payload,
}

impl Reply {
    pub fn new(payload: Payload) -> Self {
        Self {
            status: None,
            payload,
        }
    }

    /// Override the default success status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// Serializes replies and errors to wire bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a successful reply for a request made with `method`.
    pub fn encode(&self, method: &Method, reply: &Reply) -> (StatusCode, Bytes) {
        let status = reply.status.unwrap_or(if *method == Method::POST {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        });
        (status, Bytes::from(reply.payload.to_value().to_string()))
    }

    /// Encode an error envelope.
    pub fn encode_error(&self, kind: ErrorKind, message: &str) -> (StatusCode, Bytes) {
        let mut envelope = Map::new();
        envelope.insert("error".to_string(), Value::String(message.to_string()));
        (kind.status(), Bytes::from(Value::Object(envelope).to_string()))
    }

    /// Encode an `ApiError` using its own kind and message.
    pub fn encode_api_error(&self, error: &ApiError) -> (StatusCode, Bytes) {
        self.encode_error(error.kind(), &error.public_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        id: i64,
        name: String,
    }

    fn body(bytes: &Bytes) -> &str {
        std::str::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_record_keeps_field_order() {
        let reply = Reply::new(Payload::record(&Row { id: 1, name: "a".into() }).unwrap());
        let (status, bytes) = ResponseEncoder::new().encode(&Method::GET, &reply);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body(&bytes), r#"{"id":1,"name":"a"}"#);
    }

    #[test]
    fn test_post_defaults_to_created() {
        let reply = Reply::new(Payload::Absent);
        let (status, bytes) = ResponseEncoder::new().encode(&Method::POST, &reply);
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body(&bytes), "null");
    }

    #[test]
    fn test_explicit_status_wins() {
        let reply = Reply::new(Payload::Absent).with_status(StatusCode::ACCEPTED);
        let (status, _) = ResponseEncoder::new().encode(&Method::POST, &reply);
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[test]
    fn test_collection_and_optional() {
        let rows = vec![Row { id: 1, name: "a".into() }, Row { id: 2, name: "b".into() }];
        let reply = Reply::new(Payload::collection(&rows).unwrap());
        let (_, bytes) = ResponseEncoder::new().encode(&Method::GET, &reply);
        assert_eq!(body(&bytes), r#"[{"id":1,"name":"a"},{"id":2,"name":"b"}]"#);

        let empty: Vec<Row> = Vec::new();
        let (_, bytes) = ResponseEncoder::new()
            .encode(&Method::GET, &Reply::new(Payload::collection(&empty).unwrap()));
        assert_eq!(body(&bytes), "[]");

        let absent = Payload::optional::<Row>(None).unwrap();
        assert_eq!(absent, Payload::Absent);
    }

    #[test]
    fn test_quotes_are_escaped() {
        let row = Row { id: 3, name: r#"say "hi""#.into() };
        let (_, bytes) = ResponseEncoder::new()
            .encode(&Method::GET, &Reply::new(Payload::record(&row).unwrap()));
        assert_eq!(body(&bytes), r#"{"id":3,"name":"say \"hi\""}"#);
    }

    #[test]
    fn test_error_envelope() {
        let (status, bytes) =
            ResponseEncoder::new().encode_error(ErrorKind::Validation, r#"bad "email""#);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body(&bytes), r#"{"error":"bad \"email\""}"#);

        let (status, _) = ResponseEncoder::new().encode_error(ErrorKind::Routing, "Not Found");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_non_object_record_rejected() {
        assert!(Payload::record(&5).is_err());
    }
}
