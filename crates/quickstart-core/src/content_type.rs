//! Content type documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a content type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentTypeStatus {
    #[default]
    Draft,
    Active,
    Deprecated,
}

impl ContentTypeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentTypeStatus::Draft => "draft",
            ContentTypeStatus::Active => "active",
            ContentTypeStatus::Deprecated => "deprecated",
        }
    }

    /// Parse a status name (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(ContentTypeStatus::Draft),
            "active" | "published" => Some(ContentTypeStatus::Active),
            "deprecated" | "archived" => Some(ContentTypeStatus::Deprecated),
            _ => None,
        }
    }
}

/// A declarative, JSON-schema-shaped description of an editable entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentType {
    #[serde(default)]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub status: ContentTypeStatus,
    /// Environment this document belongs to; empty means shared.
    #[serde(default)]
    pub environment: Option<String>,
    /// JSON-schema object.
    #[serde(default)]
    pub schema: Value,
    /// Per-field UI hints.
    #[serde(default)]
    pub ui_schema: Option<Value>,
    /// Capability flags (`panel_slug`, `panel_traits`, `translations`, `workflow`, ...).
    #[serde(default)]
    pub capabilities: Map<String, Value>,
    #[serde(default)]
    pub schema_version: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl ContentType {
    /// Create a draft content type with the given slug and schema.
    pub fn new(slug: impl Into<String>, schema: Value) -> Self {
        let slug = slug.into();
        Self {
            id: String::new(),
            name: String::new(),
            slug,
            icon: None,
            status: ContentTypeStatus::Draft,
            environment: None,
            schema,
            ui_schema: None,
            capabilities: Map::new(),
            schema_version: None,
            updated_by: None,
        }
    }

    /// Stable key used for version history: id, falling back to slug.
    pub fn key(&self) -> &str {
        if self.id.trim().is_empty() {
            self.slug.trim()
        } else {
            self.id.trim()
        }
    }

    pub fn capability(&self, key: &str) -> Option<&Value> {
        self.capabilities.get(key)
    }

    fn capability_str(&self, key: &str) -> Option<&str> {
        self.capability(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Storage identity: the `panel_slug` capability when declared, else the slug.
    pub fn panel_slug(&self) -> &str {
        self.capability_str("panel_slug").unwrap_or(self.slug.as_str())
    }

    /// Display label: the name, else the slug.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.slug
        } else {
            &self.name
        }
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref().filter(|i| !i.trim().is_empty())
    }

    pub fn is_active(&self) -> bool {
        self.status == ContentTypeStatus::Active
    }

    /// Whether the `translations` capability is switched on.
    pub fn translations_enabled(&self) -> bool {
        match self.capability("translations") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Object(obj)) => obj.get("enabled").and_then(Value::as_bool).unwrap_or(false),
            _ => false,
        }
    }

    pub fn workflow(&self) -> Option<&str> {
        self.capability_str("workflow")
    }

    /// Panel traits (accepts a list of strings or a single string).
    pub fn panel_traits(&self) -> Vec<String> {
        match self.capability("panel_traits") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }

    /// Whether this document is visible in `environment`.
    ///
    /// Documents without an environment are shared across all environments.
    pub fn matches_environment(&self, environment: &str) -> bool {
        match self.environment.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(env) => env.eq_ignore_ascii_case(environment.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_panel_slug_prefers_capability() {
        let mut ct = ContentType::new("pages", json!({}));
        assert_eq!(ct.panel_slug(), "pages");

        ct.capabilities.insert("panel_slug".to_string(), json!("news"));
        assert_eq!(ct.panel_slug(), "news");

        ct.capabilities.insert("panel_slug".to_string(), json!("  "));
        assert_eq!(ct.panel_slug(), "pages");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let ct: ContentType = serde_json::from_value(json!({
            "slug": "posts",
            "status": "active",
            "schema": {"type": "object"},
            "capabilities": {"translations": true, "panel_traits": ["editorial"]}
        }))
        .unwrap();

        assert!(ct.is_active());
        assert!(ct.translations_enabled());
        assert_eq!(ct.panel_traits(), vec!["editorial".to_string()]);
        assert_eq!(ct.label(), "posts");
        assert_eq!(ct.key(), "posts");
    }

    #[test]
    fn test_environment_matching() {
        let mut ct = ContentType::new("pages", json!({}));
        assert!(ct.matches_environment("staging"));

        ct.environment = Some("prod".to_string());
        assert!(ct.matches_environment("PROD"));
        assert!(!ct.matches_environment("staging"));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ContentTypeStatus::parse("Active"), Some(ContentTypeStatus::Active));
        assert_eq!(ContentTypeStatus::parse("draft"), Some(ContentTypeStatus::Draft));
        assert_eq!(ContentTypeStatus::parse("bogus"), None);
    }
}
