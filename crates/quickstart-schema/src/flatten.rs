//! Flatten a JSON schema into a dotted-path lookup table.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// JSON-schema primitive type of a flattened property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Number,
    Array,
    Object,
    String,
    /// No type declared, or a type this crate does not know.
    Unknown,
}

impl ValueKind {
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "boolean" => ValueKind::Boolean,
            "integer" => ValueKind::Integer,
            "number" => ValueKind::Number,
            "array" => ValueKind::Array,
            "object" => ValueKind::Object,
            "string" => ValueKind::String,
            _ => ValueKind::Unknown,
        }
    }

    /// Kind declared by a schema node.
    pub fn of(schema: &Value) -> Self {
        schema_type(schema)
            .map(Self::from_type_name)
            .unwrap_or(ValueKind::Unknown)
    }

    pub fn is_scalar(self) -> bool {
        !matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

/// One flattened property.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// The property's own schema node.
    pub schema: Value,
    pub kind: ValueKind,
    /// `items` schema for arrays.
    pub items: Option<Value>,
}

/// A schema flattened to `path -> FieldInfo`.
#[derive(Debug, Clone, Default)]
pub struct FlattenedSchema {
    pub fields: BTreeMap<String, FieldInfo>,
    /// Paths whose kind is boolean, in path order.
    pub boolean_paths: Vec<String>,
}

impl FlattenedSchema {
    pub fn get(&self, path: &str) -> Option<&FieldInfo> {
        self.fields.get(path)
    }

    pub fn kind_of(&self, path: &str) -> ValueKind {
        self.get(path).map(|f| f.kind).unwrap_or(ValueKind::Unknown)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Declared `type` of a schema node.
///
/// Accepts both `"type": "string"` and `"type": ["string", "null"]`; for the
/// array form the first string entry is used.
pub fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(Value::as_str),
        _ => None,
    }
}

/// Walk `properties` recursively and collect every property by dotted path.
///
/// Object properties are recursed into (the object itself is also recorded);
/// arrays are not, their `items` is attached to the array entry instead.
pub fn flatten(schema: &Value) -> FlattenedSchema {
    let mut out = FlattenedSchema::default();
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        walk(props, "", &mut out);
    }
    out
}

fn walk(props: &Map<String, Value>, prefix: &str, out: &mut FlattenedSchema) {
    for (name, node) in props {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        let kind = ValueKind::of(node);
        let items = if kind == ValueKind::Array {
            node.get("items").cloned()
        } else {
            None
        };

        if kind == ValueKind::Boolean {
            out.boolean_paths.push(path.clone());
        }
        out.fields.insert(
            path.clone(),
            FieldInfo {
                schema: node.clone(),
                kind,
                items,
            },
        );

        if kind == ValueKind::Object
            && let Some(nested) = node.get("properties").and_then(Value::as_object)
        {
            walk(nested, &path, out);
        }
    }
}

/// Whether a schema declares at least one property.
pub fn has_renderable_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|props| !props.is_empty())
}
