//! Declarative panel schema: fields, filters, actions and permissions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A selectable option on a field or filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose label equals its value.
    pub fn value(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// A field shown in a list, detail view or form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub label: String,
    /// UI field type (`text`, `select`, `checkbox`, `json`, ...).
    #[serde(default, rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A declared list filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub filter_type: String,
    #[serde(default)]
    pub operators: Vec<String>,
    #[serde(default)]
    pub default_operator: Option<String>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

impl Filter {
    pub fn new(name: impl Into<String>, filter_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter_type: filter_type.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// A custom panel action (bulk or row level).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub confirm: Option<String>,
}

/// Permission strings for each CRUD verb. Empty means "not declared".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub view: String,
    #[serde(default)]
    pub create: String,
    #[serde(default)]
    pub edit: String,
    #[serde(default)]
    pub delete: String,
}

/// Who owns the UI routes of a panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiRouteMode {
    /// Served by the generic content dispatcher and canonical routes.
    #[default]
    Default,
    /// Served only by the panel's dedicated handlers.
    Custom,
}

/// What the panel's list URL shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    #[default]
    List,
    /// The list URL shows the current user's own record.
    DetailCurrentUser,
}

/// An explicit relation from a `*_id` style field to another panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSpec {
    pub field: String,
    pub panel: String,
    /// Name used for the `<relation>_url` key; defaults to the field without `_id`.
    #[serde(default)]
    pub name: Option<String>,
}

/// The full declarative schema of a panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelSchema {
    #[serde(default)]
    pub list_fields: Vec<Field>,
    #[serde(default)]
    pub detail_fields: Vec<Field>,
    #[serde(default)]
    pub form_fields: Vec<Field>,
    /// Explicit JSON schema for forms.
    #[serde(default)]
    pub form_schema: Option<Value>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub ui_route_mode: UiRouteMode,
    #[serde(default)]
    pub entry_mode: EntryMode,
    #[serde(default)]
    pub relations: Vec<RelationSpec>,
}

impl PanelSchema {
    /// Form field with the given name.
    pub fn form_field(&self, name: &str) -> Option<&Field> {
        self.form_fields.iter().find(|f| f.name == name)
    }

    pub fn is_custom_owned(&self) -> bool {
        self.ui_route_mode == UiRouteMode::Custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_from_yaml_like_json() {
        let schema: PanelSchema = serde_json::from_value(json!({
            "list_fields": [{"name": "title", "type": "text"}],
            "form_fields": [{"name": "status", "type": "select", "options": [{"value": "draft"}]}],
            "permissions": {"view": "posts.view"},
            "ui_route_mode": "custom",
            "entry_mode": "detail_current_user"
        }))
        .unwrap();

        assert_eq!(schema.list_fields[0].field_type, "text");
        assert_eq!(schema.form_field("status").unwrap().options[0].value, "draft");
        assert_eq!(schema.permissions.view, "posts.view");
        assert!(schema.permissions.edit.is_empty());
        assert!(schema.is_custom_owned());
        assert_eq!(schema.entry_mode, EntryMode::DetailCurrentUser);
    }
}
