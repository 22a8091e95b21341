//! Flat record decoding for request bodies.
//!
//! # Rules
//! - The payload must be a JSON object (an empty body counts as `{}`)
//! - Every declared field is present in the output
//! - Missing or `null` fields take the zero value (`0`, `""`)
//! - Unknown fields are ignored, whatever their shape
//! - Declared fields must hold scalars; nested objects/arrays are rejected
//! - Numeric fields accept JSON integers or strings holding an integer

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::binder::BindingError;
use crate::routing::descriptor::{RecordShape, ScalarKind};

/// A domain record that can be bound from a flat request body.
pub trait FlatRecord: Serialize + DeserializeOwned {
    const SHAPE: &'static RecordShape;
}

/// A decoded flat record: every declared field, normalized to its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Convert into a concrete record type.
    pub fn into_typed<T: FlatRecord>(self) -> Result<T, BindingError> {
        serde_json::from_value(Value::Object(self.fields)).map_err(|e| BindingError::Body {
            message: format!("cannot build {}: {}", T::SHAPE.name, e),
        })
    }
}

/// Decode a raw payload according to a record shape.
pub fn decode_record(shape: &'static RecordShape, raw: &[u8]) -> Result<Record, BindingError> {
    let object = parse_object(raw)?;
    let mut fields = Map::new();

    for spec in shape.fields {
        let value = match object.get(spec.name) {
            None | Some(Value::Null) => zero_value(spec.kind),
            Some(value) => coerce_field(spec.name, spec.kind, value)?,
        };
        fields.insert(spec.name.to_string(), value);
    }

    Ok(Record { fields })
}

/// Decode straight into a typed record.
pub fn decode<T: FlatRecord>(raw: &[u8]) -> Result<T, BindingError> {
    decode_record(T::SHAPE, raw)?.into_typed()
}

fn parse_object(raw: &[u8]) -> Result<Map<String, Value>, BindingError> {
    let text = std::str::from_utf8(raw).map_err(|_| BindingError::Body {
        message: "request body is not valid UTF-8".to_string(),
    })?;

    if text.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(BindingError::Body {
            message: "request body must be a JSON object".to_string(),
        }),
        Err(e) => Err(BindingError::Body {
            message: format!("malformed JSON body: {}", e),
        }),
    }
}

fn zero_value(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Integer | ScalarKind::LongInteger => Value::from(0),
        ScalarKind::Text => Value::String(String::new()),
    }
}

fn coerce_field(name: &str, kind: ScalarKind, value: &Value) -> Result<Value, BindingError> {
    let invalid = || BindingError::Field {
        field: name.to_string(),
        expected: kind.name(),
    };

    match kind {
        ScalarKind::Text => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            _ => Err(invalid()),
        },
        ScalarKind::LongInteger => integer_of(value).map(Value::from).ok_or_else(invalid),
        ScalarKind::Integer => integer_of(value)
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::from)
            .ok_or_else(invalid),
    }
}

fn integer_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::descriptor::FieldSpec;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        id: i64,
        count: i32,
        label: String,
    }

    impl FlatRecord for Sample {
        const SHAPE: &'static RecordShape = &RecordShape {
            name: "Sample",
            fields: &[
                FieldSpec::new("id", ScalarKind::LongInteger),
                FieldSpec::new("count", ScalarKind::Integer),
                FieldSpec::new("label", ScalarKind::Text),
            ],
        };
    }

    #[test]
    fn test_full_object() {
        let s: Sample = decode(br#"{"id": 7, "count": 3, "label": "x"}"#).unwrap();
        assert_eq!(s, Sample { id: 7, count: 3, label: "x".into() });
    }

    #[test]
    fn test_missing_fields_default() {
        let s: Sample = decode(br#"{"label": "only"}"#).unwrap();
        assert_eq!(s, Sample { id: 0, count: 0, label: "only".into() });

        let empty: Sample = decode(b"  ").unwrap();
        assert_eq!(empty, Sample { id: 0, count: 0, label: String::new() });
    }

    #[test]
    fn test_null_is_zero_value() {
        let s: Sample = decode(br#"{"id": null, "label": null}"#).unwrap();
        assert_eq!(s.id, 0);
        assert_eq!(s.label, "");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let s: Sample =
            decode(br#"{"label": "a", "extra": {"nested": [1, 2]}, "more": true}"#).unwrap();
        assert_eq!(s.label, "a");
    }

    #[test]
    fn test_commas_and_quotes_inside_strings() {
        let s: Sample = decode(br#"{"label": "Smith, \"Jr\": ok"}"#).unwrap();
        assert_eq!(s.label, r#"Smith, "Jr": ok"#);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let s: Sample = decode(br#"{"id": "12", "count": " 4 "}"#).unwrap();
        assert_eq!(s.id, 12);
        assert_eq!(s.count, 4);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let err = decode::<Sample>(br#"{"id": "abc"}"#).unwrap_err();
        assert!(matches!(err, BindingError::Field { ref field, .. } if field == "id"));

        let err = decode::<Sample>(br#"{"label": {"a": 1}}"#).unwrap_err();
        assert!(matches!(err, BindingError::Field { ref field, .. } if field == "label"));

        let err = decode::<Sample>(br#"{"count": 9999999999}"#).unwrap_err();
        assert!(matches!(err, BindingError::Field { ref field, .. } if field == "count"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(decode::<Sample>(b"[1,2]"), Err(BindingError::Body { .. })));
        assert!(matches!(decode::<Sample>(b"{\"id\":"), Err(BindingError::Body { .. })));
        assert!(matches!(decode::<Sample>(&[0xff, 0xfe]), Err(BindingError::Body { .. })));
    }
}
