//! Form value coercion driven by flattened schema types.
//!
//! HTML forms only ever submit strings; these helpers turn them back into the
//! JSON values the schema declares.

use crate::error::CoerceError;
use crate::flatten::{FieldInfo, ValueKind};
use serde_json::{Number, Value};

/// Coerce one raw form value for `path` according to `kind`.
pub fn coerce_value(path: &str, raw: &str, kind: ValueKind) -> Result<Value, CoerceError> {
    match kind {
        ValueKind::Boolean => Ok(Value::Bool(parse_bool(raw))),
        ValueKind::Integer => {
            if raw.is_empty() {
                return Ok(Value::String(String::new()));
            }
            raw.trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| CoerceError::InvalidInteger {
                    path: path.to_string(),
                    value: raw.to_string(),
                })
        }
        ValueKind::Number => {
            if raw.is_empty() {
                return Ok(Value::String(String::new()));
            }
            parse_number(raw.trim()).ok_or_else(|| CoerceError::InvalidNumber {
                path: path.to_string(),
                value: raw.to_string(),
            })
        }
        ValueKind::Array | ValueKind::Object => {
            Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
        }
        ValueKind::String => Ok(Value::String(raw.to_string())),
        ValueKind::Unknown => {
            let trimmed = raw.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
            } else {
                Ok(Value::String(raw.to_string()))
            }
        }
    }
}

/// Coerce a raw value using the flattened info for its path, if any.
pub fn coerce_field(path: &str, raw: &str, info: Option<&FieldInfo>) -> Result<Value, CoerceError> {
    let kind = info.map(|i| i.kind).unwrap_or(ValueKind::Unknown);
    coerce_value(path, raw, kind)
}

/// Coerce repeated values of an array field, one element per value.
pub fn coerce_list(path: &str, raws: &[String], items: Option<&Value>) -> Result<Value, CoerceError> {
    let kind = items.map(ValueKind::of).unwrap_or(ValueKind::String);
    let kind = if kind == ValueKind::Unknown {
        ValueKind::String
    } else {
        kind
    };
    raws.iter()
        .map(|raw| coerce_value(path, raw, kind))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Resolve repeated values submitted for a scalar field.
///
/// Identical values collapse to one. When every value is blank the last
/// candidate is kept. Distinct non-blank values are ambiguous and rejected.
pub fn coerce_scalar_multi(
    path: &str,
    raws: &[String],
    kind: ValueKind,
) -> Result<Value, CoerceError> {
    let mut distinct: Vec<&str> = Vec::new();
    for raw in raws {
        let trimmed = raw.trim();
        if !trimmed.is_empty() && !distinct.contains(&trimmed) {
            distinct.push(trimmed);
        }
    }

    match distinct.as_slice() {
        [single] => coerce_value(path, single, kind),
        [] => {
            let last = raws.last().map(String::as_str).unwrap_or("");
            coerce_value(path, last, kind)
        }
        _ => Err(CoerceError::ConflictingValues {
            path: path.to_string(),
            values: distinct.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

/// `""`, `0`, `false`, `off` and `no` are false; anything else is true.
pub fn parse_bool(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::from(i));
    }
    let f = raw.parse::<f64>().ok()?;
    Number::from_f64(f).map(Value::Number)
}
