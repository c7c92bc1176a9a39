//! Schema compatibility analysis.
//!
//! Compares two JSON schemas property by property and classifies each change
//! as breaking (existing records or consumers may be invalidated) or a warning.

use crate::flatten::schema_type;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// One detected change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaChange {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// Dotted path, e.g. `properties.title.type`.
    pub path: String,
    /// Property name the change applies to.
    pub field: String,
    pub description: String,
    pub is_breaking: bool,
}

/// Result of comparing two schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub compatible: bool,
    pub breaking_changes: Vec<SchemaChange>,
    pub warnings: Vec<SchemaChange>,
}

impl CompatibilityReport {
    /// Every change, breaking first.
    pub fn changes(&self) -> Vec<SchemaChange> {
        self.breaking_changes
            .iter()
            .chain(self.warnings.iter())
            .cloned()
            .collect()
    }

    pub fn is_breaking(&self) -> bool {
        !self.breaking_changes.is_empty()
    }

    fn push(&mut self, change: SchemaChange) {
        if change.is_breaking {
            self.breaking_changes.push(change);
        } else {
            self.warnings.push(change);
        }
    }
}

/// Compare `old` against `new`.
pub fn compare_schemas(old: &Value, new: &Value) -> CompatibilityReport {
    let mut report = CompatibilityReport::default();
    compare_level(old, new, "", &mut report);
    report.compatible = report.breaking_changes.is_empty();
    report
}

fn properties(schema: &Value) -> BTreeMap<&str, &Value> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.iter().map(|(k, v)| (k.as_str(), v)).collect())
        .unwrap_or_default()
}

fn required_set(schema: &Value) -> BTreeSet<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn enum_values(schema: &Value) -> Option<&Vec<Value>> {
    schema.get("enum").and_then(Value::as_array)
}

fn compare_level(old: &Value, new: &Value, prefix: &str, report: &mut CompatibilityReport) {
    let old_props = properties(old);
    let new_props = properties(new);
    let old_required = required_set(old);
    let new_required = required_set(new);

    for (name, _) in &old_props {
        if new_props.contains_key(name) {
            continue;
        }
        let was_required = old_required.contains(name);
        report.push(SchemaChange {
            change_type: ChangeType::Removed,
            path: format!("{}properties.{}", prefix, name),
            field: name.to_string(),
            description: if was_required {
                format!("required property '{}' removed", name)
            } else {
                format!("property '{}' removed", name)
            },
            is_breaking: was_required,
        });
    }

    for (name, new_prop) in &new_props {
        let path = format!("{}properties.{}", prefix, name);
        let Some(old_prop) = old_props.get(name) else {
            let now_required = new_required.contains(name);
            report.push(SchemaChange {
                change_type: ChangeType::Added,
                path,
                field: name.to_string(),
                description: if now_required {
                    format!("required property '{}' added", name)
                } else {
                    format!("property '{}' added", name)
                },
                is_breaking: now_required,
            });
            continue;
        };

        compare_property(name, &path, old_prop, new_prop, report);

        let was_required = old_required.contains(name);
        let now_required = new_required.contains(name);
        if was_required != now_required {
            report.push(SchemaChange {
                change_type: ChangeType::Modified,
                path: format!("{}.required", path),
                field: name.to_string(),
                description: if now_required {
                    format!("property '{}' is now required", name)
                } else {
                    format!("property '{}' is no longer required", name)
                },
                is_breaking: true,
            });
        }

        if old_prop.get("properties").is_some() || new_prop.get("properties").is_some() {
            compare_level(old_prop, new_prop, &format!("{}.", path), report);
        }
    }
}

fn compare_property(
    name: &str,
    path: &str,
    old: &Value,
    new: &Value,
    report: &mut CompatibilityReport,
) {
    if let (Some(old_type), Some(new_type)) = (schema_type(old), schema_type(new))
        && old_type != new_type
    {
        report.push(SchemaChange {
            change_type: ChangeType::Modified,
            path: format!("{}.type", path),
            field: name.to_string(),
            description: format!("type changed from '{}' to '{}'", old_type, new_type),
            is_breaking: true,
        });
    }

    if let (Some(old_enum), Some(new_enum)) = (enum_values(old), enum_values(new)) {
        let removed: Vec<String> = old_enum
            .iter()
            .filter(|v| !new_enum.contains(v))
            .map(display_value)
            .collect();
        let added: Vec<String> = new_enum
            .iter()
            .filter(|v| !old_enum.contains(v))
            .map(display_value)
            .collect();

        if !removed.is_empty() {
            report.push(SchemaChange {
                change_type: ChangeType::Modified,
                path: format!("{}.enum", path),
                field: name.to_string(),
                description: format!("enum values removed: {}", removed.join(", ")),
                is_breaking: true,
            });
        }
        if !added.is_empty() {
            report.push(SchemaChange {
                change_type: ChangeType::Modified,
                path: format!("{}.enum", path),
                field: name.to_string(),
                description: format!("enum values added: {}", added.join(", ")),
                is_breaking: false,
            });
        }
    }

    let old_desc = old.get("description").and_then(Value::as_str).unwrap_or("");
    let new_desc = new.get("description").and_then(Value::as_str).unwrap_or("");
    if old_desc != new_desc {
        report.push(SchemaChange {
            change_type: ChangeType::Modified,
            path: format!("{}.description", path),
            field: name.to_string(),
            description: "description changed".to_string(),
            is_breaking: false,
        });
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Empty object schema, used as the baseline for a brand-new content type.
pub fn empty_schema() -> Value {
    Value::Object(Map::new())
}
