//! Conversions between [`gentable_core::Value`] and the plain JSON the
//! Python harness script reads and writes. `Value`'s own serialization
//! (`{"type": ..., "data": ...}`, see `gentable_core::Value`) is the wire
//! format between engine components; the sandbox needs the row exposed as
//! an ordinary Python dict (`row['col']`), so cells round-trip through
//! plain JSON scalars instead.

use gentable_core::{MediaSource, Value};
use gentable_error::{SandboxError, SandboxErrorKind};
use std::collections::HashMap;

/// Render a row's values as a plain JSON object, the shape the harness
/// script binds to `row`. Media cells degrade to their stored reference
/// string — a snippet has no business reading raw bytes inline.
pub fn row_to_plain_json(row: &HashMap<String, Value>) -> serde_json::Value {
    let mut map = serde_json::Map::with_capacity(row.len());
    for (column, value) in row {
        map.insert(column.clone(), value_to_plain_json(value));
    }
    serde_json::Value::Object(map)
}

fn value_to_plain_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int(i) => serde_json::json!(i),
        Value::Float(f) => serde_json::json!(f),
        Value::Bool(b) => serde_json::json!(b),
        Value::Str(s) => serde_json::json!(s),
        Value::Image(m) | Value::Audio(m) | Value::Document(m) => media_source_ref(m),
        Value::Vector(v) => serde_json::json!(v),
    }
}

fn media_source_ref(m: &MediaSource) -> serde_json::Value {
    match m {
        MediaSource::Url(url) => serde_json::json!(url),
        MediaSource::Base64(_) => serde_json::json!("[base64 media]"),
        MediaSource::Binary(bytes) => serde_json::json!(format!("[binary media: {} bytes]", bytes.len())),
    }
}

/// Parse the scalar the harness script printed as `result` back into a
/// [`Value`] (spec §3: Python "returns a scalar"). Arrays and objects are
/// rejected — `PythonGen` materializes exactly one data column.
pub fn plain_json_to_scalar_value(value: serde_json::Value) -> Result<Value, SandboxError> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(SandboxError::new(SandboxErrorKind::MalformedOutput(format!(
                    "unrepresentable number: {n}"
                ))))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        other => Err(SandboxError::new(SandboxErrorKind::MalformedOutput(format!(
            "expected a scalar result, got {other}"
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_round_trips_scalars() {
        let mut row = HashMap::new();
        row.insert("a".to_string(), Value::Int(3));
        row.insert("b".to_string(), Value::Str("hi".to_string()));
        let json = row_to_plain_json(&row);
        assert_eq!(json["a"], 3);
        assert_eq!(json["b"], "hi");
    }

    #[test]
    fn scalar_result_parses() {
        assert_eq!(plain_json_to_scalar_value(serde_json::json!(4)).unwrap(), Value::Int(4));
        assert_eq!(
            plain_json_to_scalar_value(serde_json::json!("x")).unwrap(),
            Value::Str("x".to_string())
        );
    }

    #[test]
    fn array_result_is_rejected() {
        let err = plain_json_to_scalar_value(serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err.kind, SandboxErrorKind::MalformedOutput(_)));
    }
}
