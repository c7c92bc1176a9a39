//! Create/edit forms.
//!
//! The effective schema is the content type's schema when it declares
//! properties, then the panel's explicit form schema, then one synthesized
//! from the panel's form fields.

use crate::html::html_escape;
use crate::panel_context::PanelContext;
use crate::query::append_query;
use crate::state::ConsoleState;
use crate::templates::ViewError;
use crate::translation::TranslationState;
use quickstart_core::record::{self, Record};
use quickstart_core::{AdminError, AdminResult, ContentType, PanelSchema};
use quickstart_policy::features;
use quickstart_schema::{
    ValueKind, get_path, has_renderable_properties, sanitize_schema, schema_from_fields,
};
use serde_json::{Map, Value, json};

/// Input to a [`FormRenderer`].
#[derive(Debug, Clone, Copy)]
pub struct FormRequest<'a> {
    pub schema: &'a Value,
    pub ui_schema: Option<&'a Value>,
    pub values: &'a Record,
    /// Form action URL.
    pub action: &'a str,
    pub is_edit: bool,
}

/// Turns a JSON schema and values into form HTML.
pub trait FormRenderer: Send + Sync {
    fn render(&self, request: &FormRequest<'_>) -> Result<String, ViewError>;
}

/// Plain HTML form renderer.
///
/// Enums become selects, booleans checkboxes, numbers number inputs, objects
/// with properties nested fieldsets, and other objects and arrays JSON
/// textareas. `ui_schema` entries may set `ui:widget` (or `widget`),
/// `ui:placeholder`, `ui:help` and `ui:order`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormRenderer;

impl FormRenderer for HtmlFormRenderer {
    fn render(&self, request: &FormRequest<'_>) -> Result<String, ViewError> {
        let mut fields = String::new();
        render_properties(request.schema, request.ui_schema, request.values, "", &mut fields);

        let submit = if request.is_edit { "Save" } else { "Create" };
        Ok(format!(
            r#"<form method="post" action="{}" class="content-form">
{fields}<div class="form-actions"><button type="submit" class="btn btn-primary">{submit}</button></div>
</form>"#,
            html_escape(request.action)
        ))
    }
}

fn ordered_properties<'a>(
    props: &'a Map<String, Value>,
    ui: Option<&Value>,
) -> Vec<(&'a String, &'a Value)> {
    let order: Vec<&str> = ui
        .and_then(|u| u.get("ui:order"))
        .and_then(Value::as_array)
        .map(|o| o.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let mut entries: Vec<(&String, &Value)> = props.iter().collect();
    entries.sort_by_key(|(name, _)| {
        order
            .iter()
            .position(|o| *o == name.as_str())
            .unwrap_or(order.len())
    });
    entries
}

fn hint<'a>(ui: Option<&'a Value>, keys: &[&str]) -> Option<&'a str> {
    let ui = ui?;
    keys.iter().find_map(|k| ui.get(*k).and_then(Value::as_str))
}

fn render_properties(
    schema: &Value,
    ui: Option<&Value>,
    values: &Record,
    prefix: &str,
    out: &mut String,
) {
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    for (name, node) in ordered_properties(props, ui) {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        let field_ui = ui.and_then(|u| u.get(name.as_str()));
        let kind = ValueKind::of(node);

        if kind == ValueKind::Object && has_renderable_properties(node) {
            let legend = node.get("title").and_then(Value::as_str).unwrap_or(name);
            out.push_str(&format!(
                "<fieldset><legend>{}</legend>\n",
                html_escape(legend)
            ));
            render_properties(node, field_ui, values, &path, out);
            out.push_str("</fieldset>\n");
            continue;
        }

        let value = get_path(values, &path).or_else(|| node.get("default"));
        out.push_str(&render_input(
            &path,
            name,
            node,
            kind,
            field_ui,
            value,
            required.contains(&name.as_str()),
        ));
    }
}

fn render_input(
    path: &str,
    name: &str,
    node: &Value,
    kind: ValueKind,
    ui: Option<&Value>,
    value: Option<&Value>,
    required: bool,
) -> String {
    let label = html_escape(node.get("title").and_then(Value::as_str).unwrap_or(name));
    let id = html_escape(&path.replace('.', "-"));
    let path = html_escape(path);
    let required_attr = if required { " required" } else { "" };
    let placeholder = hint(ui, &["ui:placeholder", "placeholder"])
        .map(|p| format!(r#" placeholder="{}""#, html_escape(p)))
        .unwrap_or_default();
    let help = hint(ui, &["ui:help", "help"])
        .or_else(|| node.get("description").and_then(Value::as_str))
        .map(|h| format!(r#"<small class="help">{}</small>"#, html_escape(h)))
        .unwrap_or_default();
    let text = value.and_then(record::value_to_string).unwrap_or_default();
    let widget = hint(ui, &["ui:widget", "widget"]).unwrap_or("");

    let control = if widget == "hidden" {
        return format!(
            r#"<input type="hidden" name="{path}" value="{}">
"#,
            html_escape(&text)
        );
    } else if let Some(options) = node.get("enum").and_then(Value::as_array) {
        let options_html: String = options
            .iter()
            .filter_map(record::value_to_string)
            .map(|opt| {
                let selected = if opt == text { " selected" } else { "" };
                let opt = html_escape(&opt);
                format!(r#"<option value="{opt}"{selected}>{opt}</option>"#)
            })
            .collect();
        format!(
            r#"<select name="{path}" id="{id}"{required_attr}><option value=""></option>{options_html}</select>"#
        )
    } else {
        match kind {
            ValueKind::Boolean => {
                let checked = if value.is_some_and(record::truthy) { " checked" } else { "" };
                format!(r#"<input type="checkbox" name="{path}" id="{id}" value="true"{checked}>"#)
            }
            ValueKind::Integer | ValueKind::Number => {
                let step = if kind == ValueKind::Integer { "1" } else { "any" };
                format!(
                    r#"<input type="number" step="{step}" name="{path}" id="{id}" value="{}"{placeholder}{required_attr}>"#,
                    html_escape(&text)
                )
            }
            ValueKind::Array | ValueKind::Object => {
                let json = value
                    .filter(|v| !v.is_null())
                    .map(|v| serde_json::to_string_pretty(v).unwrap_or_default())
                    .unwrap_or_default();
                format!(
                    r#"<textarea name="{path}" id="{id}" rows="6" class="json"{required_attr}>{}</textarea>"#,
                    html_escape(&json)
                )
            }
            _ if widget == "textarea" => format!(
                r#"<textarea name="{path}" id="{id}" rows="6"{placeholder}{required_attr}>{}</textarea>"#,
                html_escape(&text)
            ),
            _ => {
                let input_type = match (widget, node.get("format").and_then(Value::as_str)) {
                    ("password" | "email" | "url" | "color", _) => widget,
                    (_, Some("date")) => "date",
                    (_, Some("date-time")) => "datetime-local",
                    (_, Some("email")) => "email",
                    (_, Some("uri")) => "url",
                    _ => "text",
                };
                format!(
                    r#"<input type="{input_type}" name="{path}" id="{id}" value="{}"{placeholder}{required_attr}>"#,
                    html_escape(&text)
                )
            }
        }
    };

    format!(
        r#"<div class="form-field"><label for="{id}">{label}</label>{control}{help}</div>
"#
    )
}

/// The schema forms are rendered from, sanitized. `None` when no candidate
/// declares any property.
pub fn effective_schema(schema: &PanelSchema, content_type: Option<&ContentType>) -> Option<Value> {
    let candidates = [
        content_type.map(|ct| ct.schema.clone()),
        schema.form_schema.clone(),
        schema_from_fields(&schema.form_fields),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(has_renderable_properties)
        .map(|s| sanitize_schema(&s))
}

/// Effective schema or `SCHEMA_REQUIRED`.
pub fn require_schema(pctx: &PanelContext) -> AdminResult<Value> {
    effective_schema(pctx.panel.schema(), pctx.content_type.as_ref())
        .ok_or_else(|| AdminError::schema_required(&pctx.name))
}

/// Create posts to the panel base; edit posts to the record, keeping the
/// requested locale.
pub fn form_action(pctx: &PanelContext, id: Option<&str>) -> String {
    match id {
        Some(id) => pctx.carry(&pctx.detail_url(id)),
        None => append_query(&pctx.index_url(), &pctx.query.environment_params()),
    }
}

/// `<path>?preview_token=<token>` from the record's `path`, `preview_url`
/// or `slug`.
pub fn preview_url(item: &Record, token: &str) -> Option<String> {
    let target = record::string_field(item, "path")
        .or_else(|| record::string_field(item, "preview_url"))
        .or_else(|| {
            record::string_field(item, "slug").map(|slug| format!("/{}", slug.trim_start_matches('/')))
        })?;
    Some(append_query(&target, &[("preview_token", token)]))
}

/// Build the `resources/content/form` view context.
pub async fn form_view(
    state: &ConsoleState,
    pctx: &PanelContext,
    item: Option<&Record>,
) -> AdminResult<Map<String, Value>> {
    let schema = require_schema(pctx)?;
    let values = item.map(record::presented).unwrap_or_default();
    let id = item.and_then(record::record_id);
    let action = form_action(pctx, id.as_deref());

    let form_html = state.form_renderer().render(&FormRequest {
        schema: &schema,
        ui_schema: pctx.ui_schema(),
        values: &values,
        action: &action,
        is_edit: id.is_some(),
    })?;

    let preview = match (state.preview(), item, id.as_deref()) {
        (Some(service), Some(item), Some(id)) => {
            let token = service.generate_token(&pctx.admin, &pctx.name, id).await?;
            preview_url(item, &token)
        }
        _ => None,
    };

    let mut view = Map::new();
    view.insert("form_html".into(), Value::String(form_html));
    view.insert("form_action".into(), Value::String(action));
    view.insert("resource_item".into(), Value::Object(values));
    view.insert("is_edit".into(), Value::Bool(id.is_some()));
    view.insert("create_success".into(), Value::Bool(pctx.query.created_marker()));
    view.insert("preview_url".into(), preview.map(Value::String).unwrap_or(Value::Null));
    view.insert("content_type".into(), pctx.content_type_descriptor());
    view.insert("schema".into(), schema);
    view.insert(
        "requested_locale".into(),
        json!(pctx.requested_locale()),
    );
    if let Some(item) = item
        && state.features().is_enabled(features::TRANSLATIONS)
    {
        view.insert(
            "translation".into(),
            serde_json::to_value(TranslationState::from_record(item))?,
        );
    }
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickstart_core::{Field, FieldOption};

    fn render(schema: Value, ui: Option<Value>, values: Value) -> String {
        let values = values.as_object().cloned().unwrap_or_default();
        HtmlFormRenderer
            .render(&FormRequest {
                schema: &schema,
                ui_schema: ui.as_ref(),
                values: &values,
                action: "/admin/content/pages",
                is_edit: false,
            })
            .unwrap()
    }

    #[test]
    fn test_effective_schema_order() {
        let panel = PanelSchema {
            form_fields: vec![Field::new("title", "text")],
            form_schema: Some(json!({"properties": {"headline": {"type": "string"}}})),
            ..Default::default()
        };
        let mut ct = ContentType::new("pages", json!({"type": "object", "properties": {}}));

        let schema = effective_schema(&panel, Some(&ct)).unwrap();
        assert!(schema["properties"].get("headline").is_some());
        assert_eq!(schema["$schema"], quickstart_schema::DEFAULT_DIALECT);

        ct.schema = json!({"properties": {"body": {"type": "string", "readOnly": true}}});
        let schema = effective_schema(&panel, Some(&ct)).unwrap();
        assert!(schema["properties"]["body"].get("readOnly").is_none());

        let fields_only = PanelSchema {
            form_fields: vec![Field::new("title", "text")],
            ..Default::default()
        };
        let schema = effective_schema(&fields_only, None).unwrap();
        assert_eq!(schema["properties"]["title"]["type"], "string");

        assert!(effective_schema(&PanelSchema::default(), None).is_none());
    }

    #[test]
    fn test_widgets() {
        let panel = PanelSchema {
            form_fields: vec![
                Field::new("status", "select")
                    .with_options(vec![FieldOption::value("draft"), FieldOption::value("published")]),
                Field::new("featured", "checkbox"),
                Field::new("rank", "integer"),
                Field::new("meta", "json"),
            ],
            ..Default::default()
        };
        let schema = effective_schema(&panel, None).unwrap();
        let html = render(
            schema,
            None,
            json!({"status": "published", "featured": true, "rank": 3, "meta": {"a": 1}}),
        );
        assert!(html.contains(r#"<option value="published" selected>"#));
        assert!(html.contains(r#"type="checkbox" name="featured" id="featured" value="true" checked"#));
        assert!(html.contains(r#"type="number" step="1" name="rank" id="rank" value="3""#));
        assert!(html.contains("<textarea name=\"meta\""));
        assert!(html.contains("&quot;a&quot;: 1"));
    }

    #[test]
    fn test_nested_objects_and_hints() {
        let schema = json!({
            "properties": {
                "title": {"type": "string"},
                "body": {"type": "string"},
                "seo": {"type": "object", "properties": {"title": {"type": "string"}}}
            },
            "required": ["title"]
        });
        let ui = json!({"ui:order": ["body", "title"], "body": {"ui:widget": "textarea"}});
        let html = render(schema, Some(ui), json!({"seo": {"title": "S"}}));
        assert!(html.contains(r#"name="seo.title" id="seo-title" value="S""#));
        assert!(html.contains(r#"<textarea name="body""#));
        assert!(html.contains(r#"name="title" id="title" value="" required"#));
        assert!(html.find("name=\"body\"").unwrap() < html.find("name=\"title\"").unwrap());
    }

    #[test]
    fn test_preview_url() {
        let item = json!({"path": "/blog/hello"}).as_object().cloned().unwrap();
        assert_eq!(
            preview_url(&item, "a b").as_deref(),
            Some("/blog/hello?preview_token=a+b")
        );
        let item = json!({"slug": "about"}).as_object().cloned().unwrap();
        assert_eq!(preview_url(&item, "t").as_deref(), Some("/about?preview_token=t"));
        assert_eq!(preview_url(&Record::new(), "t"), None);
    }
}
