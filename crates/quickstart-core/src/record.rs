//! Records and list options.
//!
//! A record is the unstructured `field -> value` map returned by a repository.
//! `serde_json::Value` already is the typed `Scalar | List | Object` variant the
//! rest of the console works against.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

/// Key of the nested payload sub-map.
pub const DATA_KEY: &str = "data";

/// Flatten the nested `data` sub-map into the top level for presentation.
///
/// Top-level keys win on conflict.
pub fn presented(record: &Record) -> Record {
    let mut out = Record::new();
    if let Some(Value::Object(data)) = record.get(DATA_KEY) {
        for (k, v) in data {
            out.insert(k.clone(), v.clone());
        }
    }
    for (k, v) in record {
        if k == DATA_KEY && matches!(v, Value::Object(_)) {
            continue;
        }
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Read a field from the top level, falling back to the `data` sub-map.
pub fn field<'a>(record: &'a Record, key: &str) -> Option<&'a Value> {
    match record.get(key) {
        Some(v) if !v.is_null() => Some(v),
        _ => record
            .get(DATA_KEY)
            .and_then(Value::as_object)
            .and_then(|data| data.get(key)),
    }
}

/// Read a field as a trimmed, non-empty string. Numbers and booleans are stringified.
pub fn string_field(record: &Record, key: &str) -> Option<String> {
    value_to_string(field(record, key)?)
}

/// The record identity as a string.
pub fn record_id(record: &Record) -> Option<String> {
    string_field(record, "id")
}

/// Render a scalar value as a string. Empty strings and non-scalars yield `None`.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Interpret a loosely typed value as a boolean flag.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

/// A single filter predicate applied to a list request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl FilterPredicate {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// Options passed to `Repository::list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOptions {
    pub page: u64,
    pub per_page: u64,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_desc: bool,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub predicates: Vec<FilterPredicate>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            sort_by: None,
            sort_desc: false,
            search: None,
            predicates: Vec::new(),
        }
    }
}

pub const DEFAULT_PER_PAGE: u64 = 25;
pub const MAX_PER_PAGE: u64 = 500;

impl ListOptions {
    /// Options returning everything on a single page.
    pub fn all() -> Self {
        Self {
            per_page: MAX_PER_PAGE,
            ..Default::default()
        }
    }

    pub fn with_predicate(mut self, predicate: FilterPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Zero-based offset of the first item on the page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_presented_top_level_wins() {
        let record = obj(json!({
            "id": "1",
            "title": "Top",
            "data": {"title": "Nested", "body": "text"}
        }));
        let out = presented(&record);

        assert_eq!(out["title"], "Top");
        assert_eq!(out["body"], "text");
        assert!(!out.contains_key("data"));
    }

    #[test]
    fn test_field_falls_back_to_data() {
        let record = obj(json!({"id": 7, "data": {"slug": "home"}}));
        assert_eq!(record_id(&record).as_deref(), Some("7"));
        assert_eq!(string_field(&record, "slug").as_deref(), Some("home"));
        assert_eq!(string_field(&record, "missing"), None);
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("yes")));
        assert!(truthy(&json!(1)));
        assert!(!truthy(&json!("off")));
        assert!(!truthy(&Value::Null));
    }

    #[test]
    fn test_offset() {
        let opts = ListOptions {
            page: 3,
            per_page: 10,
            ..Default::default()
        };
        assert_eq!(opts.offset(), 20);
        assert_eq!(ListOptions { page: 0, ..Default::default() }.offset(), 0);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let opts = ListOptions {
            page: u64::MAX,
            per_page: MAX_PER_PAGE,
            ..Default::default()
        };
        assert_eq!(opts.offset(), u64::MAX);
    }
}
