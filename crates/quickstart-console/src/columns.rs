//! List column and filter derivation.
//!
//! Columns come from the panel's list fields (or a default set), decorated
//! with renderer hints from the content type's UI schema. Filters come from
//! the panel's declared filters, or are derived from the list fields.

use quickstart_core::record::{self, Record};
use quickstart_core::{AdminContext, Field, FieldOption, ListOptions, PanelSchema, title_case};
use quickstart_panels::PanelRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Columns shown when a panel declares no list fields.
pub const DEFAULT_COLUMNS: &[&str] = &["title", "slug", "status", "locale"];

/// Renderer that draws block chips and wants a block icon map.
pub const BLOCKS_CHIPS: &str = "blocks_chips";

const UNSORTABLE_TYPES: &[&str] = &[
    "textarea",
    "json",
    "object",
    "array",
    "block-library-picker",
    "blocks",
];

const HINT_SECTIONS: &[&str] = &["table", "list", "datagrid", "data_grid"];
const RENDERER_KEYS: &[&str] = &["renderer", "cell_renderer", "cellRenderer"];

/// A derived list column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListColumn {
    pub field: String,
    pub label: String,
    pub sortable: bool,
    pub filterable: bool,
    /// Visible by default.
    pub default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderer: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub renderer_options: Map<String, Value>,
}

/// A list filter as presented to the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub filter_type: String,
    pub operators: Vec<String>,
    pub default_operator: String,
    pub options: Vec<FieldOption>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn field_label(field: &Field) -> String {
    if field.label.trim().is_empty() {
        title_case(&field.name)
    } else {
        field.label.clone()
    }
}

/// UI hints for one field: `ui_schema[field]`, or `ui_schema.properties[field]`.
fn field_hints<'a>(ui_schema: Option<&'a Value>, field: &str) -> Option<&'a Map<String, Value>> {
    let ui = ui_schema?.as_object()?;
    ui.get(field)
        .or_else(|| ui.get("properties").and_then(|p| p.get(field)))
        .and_then(Value::as_object)
}

/// Hint maps in lookup order: table/list/datagrid sections, then the field hints.
fn hint_layers(hints: &Map<String, Value>) -> Vec<&Map<String, Value>> {
    let mut layers: Vec<&Map<String, Value>> = HINT_SECTIONS
        .iter()
        .filter_map(|section| hints.get(*section).and_then(Value::as_object))
        .collect();
    layers.push(hints);
    layers
}

fn hinted_renderer(layers: &[&Map<String, Value>]) -> Option<String> {
    layers.iter().find_map(|layer| {
        RENDERER_KEYS.iter().find_map(|key| {
            layer
                .get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    })
}

fn hinted_options(layers: &[&Map<String, Value>]) -> Map<String, Value> {
    let mut options = Map::new();
    // Later layers are less specific; never overwrite what an earlier one set.
    for layer in layers {
        if let Some(Value::Object(explicit)) = layer.get("renderer_options") {
            for (k, v) in explicit {
                options.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        for key in ["display_key", "display_keys"] {
            if let Some(v) = layer.get(key) {
                options.entry(key.to_string()).or_insert_with(|| v.clone());
            }
        }
    }
    options
}

fn builtin_renderer(field: &Field) -> Option<&'static str> {
    match field.field_type.trim().to_ascii_lowercase().as_str() {
        "array" | "multiselect" | "list" | "tags" | "block-library-picker" | "blocks" => {
            return Some("_array");
        }
        "json" | "jsonschema" | "object" => return Some("_object"),
        _ => {}
    }
    match field.name.as_str() {
        "tags" | "blocks" => Some("_array"),
        _ => None,
    }
}

fn resolve_renderer(
    field: &Field,
    layers: &[&Map<String, Value>],
    defaults: &HashMap<String, String>,
) -> Option<String> {
    hinted_renderer(layers)
        .or_else(|| defaults.get(&field.name).cloned())
        .or_else(|| {
            let ty = field.field_type.trim();
            (!ty.is_empty()).then(|| defaults.get(ty).cloned()).flatten()
        })
        .or_else(|| builtin_renderer(field).map(str::to_string))
}

fn is_sortable(field: &Field) -> bool {
    !field.hidden
        && !UNSORTABLE_TYPES.contains(&field.field_type.trim().to_ascii_lowercase().as_str())
}

fn list_fields(schema: &PanelSchema) -> Vec<Field> {
    if schema.list_fields.is_empty() {
        DEFAULT_COLUMNS
            .iter()
            .map(|name| Field::new(*name, "text"))
            .collect()
    } else {
        schema.list_fields.clone()
    }
}

/// Derive list columns for a panel.
pub fn content_entry_columns(
    schema: &PanelSchema,
    ui_schema: Option<&Value>,
    default_renderers: &HashMap<String, String>,
) -> Vec<ListColumn> {
    let filters = content_entry_filters(schema);

    list_fields(schema)
        .iter()
        .map(|field| {
            let layers = field_hints(ui_schema, &field.name)
                .map(hint_layers)
                .unwrap_or_default();
            ListColumn {
                field: field.name.clone(),
                label: field_label(field),
                sortable: is_sortable(field),
                filterable: filters.iter().any(|f| f.name == field.name),
                default: !field.hidden,
                renderer: resolve_renderer(field, &layers, default_renderers),
                renderer_options: hinted_options(&layers),
            }
        })
        .collect()
}

fn normalize_type(raw: &str) -> String {
    let ty = raw.trim().to_ascii_lowercase();
    if ty.is_empty() { "text".to_string() } else { ty }
}

fn operators_for(has_options: bool) -> (Vec<String>, String) {
    if has_options {
        (strings(&["eq", "in"]), "eq".to_string())
    } else {
        (strings(&["eq", "ilike", "in"]), "ilike".to_string())
    }
}

/// Derive list filters for a panel.
pub fn content_entry_filters(schema: &PanelSchema) -> Vec<FilterDescriptor> {
    if !schema.filters.is_empty() {
        return schema
            .filters
            .iter()
            .map(|filter| {
                let mut options = filter.options.clone();
                if let Some(form_field) = schema.form_field(&filter.name)
                    && !form_field.options.is_empty()
                {
                    options = form_field.options.clone();
                }

                let (default_ops, default_op) = operators_for(!options.is_empty());
                let operators = if filter.operators.is_empty() {
                    default_ops
                } else {
                    filter.operators.clone()
                };
                let mut default_operator = filter
                    .default_operator
                    .clone()
                    .filter(|op| !op.trim().is_empty())
                    .unwrap_or(default_op);
                if !operators.contains(&default_operator) {
                    default_operator = operators.first().cloned().unwrap_or(default_operator);
                }

                FilterDescriptor {
                    name: filter.name.clone(),
                    label: if filter.label.trim().is_empty() {
                        title_case(&filter.name)
                    } else {
                        filter.label.clone()
                    },
                    filter_type: normalize_type(&filter.filter_type),
                    operators,
                    default_operator,
                    options,
                }
            })
            .collect();
    }

    list_fields(schema)
        .iter()
        .filter(|field| !field.hidden)
        .map(|field| {
            let form_field = schema.form_field(&field.name);
            let options = form_field
                .map(|f| f.options.clone())
                .filter(|o| !o.is_empty())
                .unwrap_or_else(|| field.options.clone());
            let filter_type = if options.is_empty() {
                normalize_type(form_field.map(|f| f.field_type.as_str()).unwrap_or(""))
            } else {
                "select".to_string()
            };
            let (operators, default_operator) = operators_for(!options.is_empty());

            FilterDescriptor {
                name: field.name.clone(),
                label: field_label(field),
                filter_type,
                operators,
                default_operator,
                options,
            }
        })
        .collect()
}

/// Whether any column renders block chips.
pub fn needs_block_icons(columns: &[ListColumn]) -> bool {
    columns
        .iter()
        .any(|c| c.renderer.as_deref() == Some(BLOCKS_CHIPS))
}

/// `slug -> icon` for the active block definitions visible in `ctx`.
///
/// Best effort: a missing panel or a failed list yields an empty map.
pub async fn block_icon_map(
    registry: &PanelRegistry,
    ctx: &AdminContext,
    panel_name: &str,
) -> Map<String, Value> {
    let Some(panel) = registry.get(panel_name, ctx.environment()) else {
        return Map::new();
    };
    let mut records = Vec::new();
    let mut opts = ListOptions::all();
    loop {
        let (page, total) = match panel.list(ctx, &opts).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(panel = %panel_name, error = %err, "Failed to load block definitions");
                return Map::new();
            }
        };
        let fetched = page.len();
        records.extend(page);
        if fetched == 0 || records.len() as u64 >= total {
            break;
        }
        opts.page += 1;
    }

    records
        .iter()
        .filter(|r| is_active_definition(r))
        .filter_map(|r| {
            let slug = record::string_field(r, "slug")?;
            let icon = record::string_field(r, "icon")?;
            Some((slug, Value::String(icon)))
        })
        .collect()
}

fn is_active_definition(record: &Record) -> bool {
    match record::string_field(record, "status") {
        None => true,
        Some(status) => matches!(status.to_ascii_lowercase().as_str(), "active" | "published"),
    }
}

/// Attach `block_icons_map` to every `blocks_chips` column that lacks one.
pub fn attach_block_icons(columns: &mut [ListColumn], icons: &Map<String, Value>) {
    if icons.is_empty() {
        return;
    }
    for column in columns
        .iter_mut()
        .filter(|c| c.renderer.as_deref() == Some(BLOCKS_CHIPS))
    {
        column
            .renderer_options
            .entry("block_icons_map")
            .or_insert_with(|| Value::Object(icons.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickstart_core::Filter;
    use quickstart_core::record::MAX_PER_PAGE;
    use quickstart_panels::{InMemoryRepository, Panel};
    use serde_json::json;
    use std::sync::Arc;

    fn posts_schema() -> PanelSchema {
        PanelSchema {
            list_fields: vec![
                Field::new("title", "text"),
                Field::new("status", "text"),
                Field::new("slug", "text"),
            ],
            form_fields: vec![
                Field::new("title", "text"),
                Field::new("status", "select").with_options(vec![
                    FieldOption::value("draft"),
                    FieldOption::value("published"),
                ]),
            ],
            filters: vec![
                Filter::new("status", "select"),
                Filter::new("title", "text").with_label("Title contains"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_declared_filters_overlay_form_options() {
        let schema = posts_schema();
        let columns = content_entry_columns(&schema, None, &HashMap::new());
        assert_eq!(columns.len(), 3);
        let filterable: Vec<(&str, bool)> =
            columns.iter().map(|c| (c.field.as_str(), c.filterable)).collect();
        assert_eq!(filterable, vec![("title", true), ("status", true), ("slug", false)]);

        let filters = content_entry_filters(&schema);
        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters[0].options,
            vec![FieldOption::value("draft"), FieldOption::value("published")]
        );
        assert_eq!(filters[0].default_operator, "eq");
        assert_eq!(filters[1].label, "Title contains");
        assert_eq!(filters[1].default_operator, "ilike");
    }

    #[test]
    fn test_default_columns_and_derived_filters() {
        let schema = PanelSchema::default();
        let columns = content_entry_columns(&schema, None, &HashMap::new());
        let names: Vec<&str> = columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(names, DEFAULT_COLUMNS);
        assert!(columns.iter().all(|c| c.filterable && c.sortable));
        assert_eq!(columns[0].label, "Title");

        for filter in content_entry_filters(&schema) {
            assert!(!filter.operators.is_empty());
            assert!(filter.operators.contains(&filter.default_operator));
            assert_eq!(filter.filter_type, "text");
        }
    }

    #[test]
    fn test_derived_filter_uses_form_field() {
        let schema = PanelSchema {
            list_fields: vec![
                Field::new("status", "text"),
                Field::new("secret", "text").hidden(),
                Field::new("published_at", "text"),
            ],
            form_fields: vec![
                Field::new("status", "select").with_options(vec![FieldOption::value("draft")]),
                Field::new("published_at", "date"),
            ],
            ..Default::default()
        };
        let filters = content_entry_filters(&schema);
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].filter_type, "select");
        assert_eq!(filters[0].operators, vec!["eq", "in"]);
        assert_eq!(filters[1].filter_type, "date");
        assert_eq!(filters[1].default_operator, "ilike");

        let columns = content_entry_columns(&schema, None, &HashMap::new());
        assert!(!columns[1].sortable);
        assert!(!columns[1].default);
        assert!(!columns[1].filterable);
    }

    #[test]
    fn test_renderer_resolution_order() {
        let schema = PanelSchema {
            list_fields: vec![
                Field::new("author", "relation"),
                Field::new("blocks", "blocks"),
                Field::new("tags", "text"),
                Field::new("meta", "json"),
                Field::new("body", "textarea"),
            ],
            ..Default::default()
        };
        let ui = json!({
            "author": {"table": {"cellRenderer": "user_chip", "display_key": "name"}, "renderer": "ignored"},
            "properties": {"meta": {"renderer": "json_preview", "display_keys": ["a", "b"]}}
        });
        let defaults = HashMap::from([("blocks".to_string(), BLOCKS_CHIPS.to_string())]);

        let columns = content_entry_columns(&schema, Some(&ui), &defaults);
        let renderers: Vec<Option<&str>> =
            columns.iter().map(|c| c.renderer.as_deref()).collect();
        assert_eq!(
            renderers,
            vec![Some("user_chip"), Some(BLOCKS_CHIPS), Some("_array"), Some("json_preview"), None]
        );
        assert_eq!(columns[0].renderer_options["display_key"], "name");
        assert_eq!(columns[3].renderer_options["display_keys"], json!(["a", "b"]));
        assert!(!columns[1].sortable);
        assert!(!columns[4].sortable);
    }

    #[test]
    fn test_columns_are_deterministic() {
        let schema = posts_schema();
        let ui = json!({"title": {"list": {"renderer": "link"}}});
        let a = content_entry_columns(&schema, Some(&ui), &HashMap::new());
        let b = content_entry_columns(&schema, Some(&ui), &HashMap::new());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_block_icon_map_reads_every_page() {
        let registry = PanelRegistry::new();
        let defs: Vec<Record> = (0..MAX_PER_PAGE + 20)
            .map(|i| {
                json!({"id": format!("b{}", i), "slug": format!("block-{}", i), "icon": "cube"})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect();
        registry.register(Panel::new(
            "block_definitions",
            PanelSchema::default(),
            Arc::new(InMemoryRepository::with_records("block_definitions", defs)),
        ));

        let icons = block_icon_map(&registry, &AdminContext::default(), "block_definitions").await;
        assert_eq!(icons.len() as u64, MAX_PER_PAGE + 20);
        assert_eq!(icons[&format!("block-{}", MAX_PER_PAGE + 19)], "cube");
    }

    #[tokio::test]
    async fn test_block_icons_attached() {
        let registry = PanelRegistry::new();
        let defs: Vec<Record> = vec![
            json!({"slug": "hero", "icon": "star", "status": "active"}),
            json!({"slug": "old", "icon": "trash", "status": "archived"}),
            json!({"slug": "cta", "icon": "bolt"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        registry.register(Panel::new(
            "block_definitions",
            PanelSchema::default(),
            Arc::new(InMemoryRepository::with_records("block_definitions", defs)),
        ));

        let ctx = AdminContext::default();
        let icons = block_icon_map(&registry, &ctx, "block_definitions").await;
        assert_eq!(Value::Object(icons.clone()), json!({"hero": "star", "cta": "bolt"}));

        let mut columns = vec![
            ListColumn {
                field: "blocks".to_string(),
                label: "Blocks".to_string(),
                sortable: false,
                filterable: true,
                default: true,
                renderer: Some(BLOCKS_CHIPS.to_string()),
                renderer_options: Map::new(),
            },
            ListColumn {
                field: "other".to_string(),
                label: "Other".to_string(),
                sortable: false,
                filterable: true,
                default: true,
                renderer: Some(BLOCKS_CHIPS.to_string()),
                renderer_options: json!({"block_icons_map": {"x": "y"}})
                    .as_object()
                    .cloned()
                    .unwrap(),
            },
        ];
        assert!(needs_block_icons(&columns));
        attach_block_icons(&mut columns, &icons);
        assert_eq!(columns[0].renderer_options["block_icons_map"]["hero"], "star");
        assert_eq!(columns[1].renderer_options["block_icons_map"], json!({"x": "y"}));

        assert!(block_icon_map(&registry, &ctx, "missing").await.is_empty());
    }
}
