//! Response normalization.
//!
//! Rules, applied per key in one pass:
//! 1. Keys are lower-cased.
//! 2. A false/empty/missing `response` status fails the whole lookup.
//! 3. `genre`, `actors`, `director` and `writer` become trimmed lists.
//! 4. `year` must parse as an integer, `imdbrating` as a float.
//! 5. Everything else keeps its raw value.

use moviefetch_core::types::{ERROR_FIELD, LIST_FIELDS, RATING_FIELD, RESPONSE_FIELD, YEAR_FIELD};
use serde_json::{Map, Value};

use crate::{FieldMap, FieldValue, LookupError};

/// Decode a response body into a JSON object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, LookupError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(LookupError::NotAnObject),
    }
}

/// Build the normalized field mapping from a decoded response.
pub fn normalize_fields(raw: &Map<String, Value>) -> Result<FieldMap, LookupError> {
    let mut info = FieldMap::new();
    let mut saw_status = false;

    for (key, value) in raw {
        let key = key.to_lowercase();

        let normalized = match key.as_str() {
            RESPONSE_FIELD => {
                if is_failure_status(value) {
                    return Err(LookupError::Remote(remote_error(raw)));
                }
                saw_status = true;
                plain_value(value)
            }
            YEAR_FIELD => FieldValue::Integer(parse_year(&key, value)?),
            RATING_FIELD => FieldValue::Float(parse_rating(&key, value)?),
            k if LIST_FIELDS.contains(&k) => match value {
                Value::String(s) => FieldValue::List(split_list(s)),
                other => plain_value(other),
            },
            _ => plain_value(value),
        };

        info.insert(key, normalized);
    }

    if !saw_status {
        return Err(LookupError::Remote(remote_error(raw)));
    }

    Ok(info)
}

/// Split a comma-separated list, trimming each element.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(|part| part.trim().to_string()).collect()
}

fn is_failure_status(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => {
            let s = s.trim();
            s.is_empty() || s.eq_ignore_ascii_case("false")
        }
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn remote_error(raw: &Map<String, Value>) -> String {
    raw.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(ERROR_FIELD))
        .and_then(|(_, v)| v.as_str())
        .unwrap_or("Unknown")
        .to_string()
}

fn parse_year(field: &str, value: &Value) -> Result<i64, LookupError> {
    match value {
        Value::Number(n) if n.is_i64() => n.as_i64().ok_or_else(|| invalid(field, value)),
        Value::String(s) => s.trim().parse().map_err(|_| invalid(field, value)),
        _ => Err(invalid(field, value)),
    }
}

fn parse_rating(field: &str, value: &Value) -> Result<f64, LookupError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(field, value)),
        Value::String(s) => s.trim().parse().map_err(|_| invalid(field, value)),
        _ => Err(invalid(field, value)),
    }
}

fn invalid(field: &str, value: &Value) -> LookupError {
    let value = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    LookupError::InvalidValue {
        field: field.to_string(),
        value,
    }
}

fn plain_value(value: &Value) -> FieldValue {
    match value {
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => n
                .as_f64()
                .map(FieldValue::Float)
                .unwrap_or_else(|| FieldValue::Json(value.clone())),
        },
        other => FieldValue::Json(other.clone()),
    }
}
