//! Build a JSON schema from panel form fields, and sanitize schemas before use.

use quickstart_core::Field;
use serde_json::{Map, Value, json};

/// Default `$schema` dialect.
pub const DEFAULT_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Keywords the form renderer does not understand.
const UNSUPPORTED_KEYWORDS: &[&str] = &["readOnly", "read_only"];

/// JSON-schema type for a UI field type.
pub fn json_type_for_field(field_type: &str) -> &'static str {
    match field_type.trim().to_ascii_lowercase().as_str() {
        "checkbox" | "toggle" | "switch" | "boolean" | "bool" => "boolean",
        "integer" | "int" => "integer",
        "number" | "float" | "decimal" | "currency" => "number",
        "json" | "jsonschema" | "object" => "object",
        "multiselect" | "array" | "list" | "tags" => "array",
        _ => "string",
    }
}

/// Synthesize an object schema from form fields.
///
/// Returns `None` when there are no named fields.
pub fn schema_from_fields(fields: &[Field]) -> Option<Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in fields {
        let name = field.name.trim();
        if name.is_empty() {
            continue;
        }

        let json_type = json_type_for_field(&field.field_type);
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(json_type));
        if !field.label.trim().is_empty() {
            prop.insert("title".to_string(), json!(field.label));
        }

        let values: Vec<Value> = field
            .options
            .iter()
            .map(|o| o.value.trim())
            .filter(|v| !v.is_empty())
            .map(|v| json!(v))
            .collect();

        if json_type == "array" {
            let mut items = Map::new();
            items.insert("type".to_string(), json!("string"));
            if !values.is_empty() {
                items.insert("enum".to_string(), Value::Array(values));
            }
            prop.insert("items".to_string(), Value::Object(items));
        } else if !values.is_empty() {
            prop.insert("enum".to_string(), Value::Array(values));
        }

        if let Some(default) = &field.default {
            prop.insert("default".to_string(), default.clone());
        }
        if field.required {
            required.push(json!(name));
        }
        properties.insert(name.to_string(), Value::Object(prop));
    }

    if properties.is_empty() {
        return None;
    }

    let mut schema = Map::new();
    schema.insert("$schema".to_string(), json!(DEFAULT_DIALECT));
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Some(Value::Object(schema))
}

/// Strip unsupported keywords recursively and default `$schema`.
pub fn sanitize_schema(schema: &Value) -> Value {
    let mut out = strip_unsupported(schema);
    if let Value::Object(map) = &mut out
        && !map.contains_key("$schema")
    {
        map.insert("$schema".to_string(), json!(DEFAULT_DIALECT));
    }
    out
}

fn strip_unsupported(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !UNSUPPORTED_KEYWORDS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), strip_unsupported(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_unsupported).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickstart_core::FieldOption;

    #[test]
    fn test_type_mapping() {
        let cases = [
            ("checkbox", "boolean"),
            ("toggle", "boolean"),
            ("switch", "boolean"),
            ("bool", "boolean"),
            ("int", "integer"),
            ("integer", "integer"),
            ("currency", "number"),
            ("decimal", "number"),
            ("float", "number"),
            ("jsonschema", "object"),
            ("json", "object"),
            ("tags", "array"),
            ("multiselect", "array"),
            ("list", "array"),
            ("text", "string"),
            ("select", "string"),
            ("", "string"),
        ];
        for (field_type, expected) in cases {
            assert_eq!(json_type_for_field(field_type), expected, "{}", field_type);
        }
    }

    #[test]
    fn test_schema_from_fields() {
        let fields = vec![
            Field::new("title", "text").with_label("Title").required(),
            Field::new("status", "select").with_options(vec![
                FieldOption::value("draft"),
                FieldOption::value(""),
                FieldOption::value("published"),
            ]),
            Field::new("tags", "tags"),
            Field::new("featured", "checkbox"),
        ];

        let schema = schema_from_fields(&fields).unwrap();
        assert_eq!(
            schema,
            json!({
                "$schema": DEFAULT_DIALECT,
                "type": "object",
                "properties": {
                    "title": {"type": "string", "title": "Title"},
                    "status": {"type": "string", "enum": ["draft", "published"]},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "featured": {"type": "boolean"}
                },
                "required": ["title"]
            })
        );
    }

    #[test]
    fn test_synthesized_schema_compiles() {
        let fields = vec![
            Field::new("count", "integer").required(),
            Field::new("meta", "json"),
        ];
        let schema = schema_from_fields(&fields).unwrap();
        let validator = jsonschema::draft202012::new(&schema).unwrap();
        assert!(validator.is_valid(&json!({"count": 3, "meta": {}})));
        assert!(!validator.is_valid(&json!({"meta": {}})));
    }

    #[test]
    fn test_no_fields_yields_none() {
        assert!(schema_from_fields(&[]).is_none());
        assert!(schema_from_fields(&[Field::new(" ", "text")]).is_none());
    }

    #[test]
    fn test_sanitize_strips_read_only_recursively() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "readOnly": true},
                "seo": {"type": "object", "properties": {"slug": {"type": "string", "read_only": true}}}
            }
        });

        let clean = sanitize_schema(&schema);
        assert_eq!(clean["$schema"], DEFAULT_DIALECT);
        assert!(clean["properties"]["id"].get("readOnly").is_none());
        assert!(clean["properties"]["seo"]["properties"]["slug"].get("read_only").is_none());
    }

    #[test]
    fn test_sanitize_keeps_declared_dialect() {
        let schema = json!({"$schema": "http://json-schema.org/draft-07/schema#"});
        assert_eq!(
            sanitize_schema(&schema)["$schema"],
            "http://json-schema.org/draft-07/schema#"
        );
    }
}
