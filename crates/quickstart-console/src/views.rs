//! Built-in view engine.
//!
//! Renders the generic content pages from their JSON view context. Apps can
//! register named templates (usually `resources/<slug>/<op>`) either in code or
//! by pointing the console at a directory of `.html` files. Registered
//! templates are Tera templates rendered against the view context, with HTML
//! autoescaping on regardless of the template name.

use crate::html::{self, html_escape};
use crate::templates::{TemplateChecker, ViewEngine, ViewError};
use quickstart_core::record::value_to_string;
use serde_json::Value;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use tera::Tera;

pub const CONTENT_LIST: &str = "resources/content/list";
pub const CONTENT_DETAIL: &str = "resources/content/detail";
pub const CONTENT_FORM: &str = "resources/content/form";
pub const CONTENT_INDEX: &str = "content/index";

const BUILTIN: &[&str] = &[CONTENT_LIST, CONTENT_DETAIL, CONTENT_FORM, CONTENT_INDEX];

/// View engine serving the generic pages plus registered overrides.
pub struct BuiltinViews {
    overrides: RwLock<Tera>,
}

impl Default for BuiltinViews {
    fn default() -> Self {
        let mut tera = Tera::default();
        // Template names carry no extension, so escape everything.
        tera.autoescape_on(vec![""]);
        Self {
            overrides: RwLock::new(tera),
        }
    }
}

impl BuiltinViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.html` under `dir`; the template name is the relative path
    /// without the extension (`resources/pages/list.html` -> `resources/pages/list`).
    pub fn from_dir(dir: &Path) -> Result<Self, ViewError> {
        let mut sources = Vec::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            for entry in std::fs::read_dir(&current).map_err(|e| load_error(&current, e))? {
                let path = entry.map_err(|e| load_error(&current, e))?.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some("html") {
                    continue;
                }
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let name = relative
                    .with_extension("")
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                let source = std::fs::read_to_string(&path).map_err(|e| load_error(&path, e))?;
                sources.push((name, source));
            }
        }

        let views = Self::new();
        // Added together so `{% extends %}` resolves regardless of walk order.
        views
            .write()
            .add_raw_templates(sources)
            .map_err(|e| ViewError::Load(error_chain(&e)))?;
        tracing::info!(dir = %dir.display(), templates = views.len(), "Loaded view templates");
        Ok(views)
    }

    /// Register (or replace) a named template.
    pub fn register(&self, name: impl Into<String>, source: impl Into<String>) -> Result<(), ViewError> {
        let name = name.into();
        let source: String = source.into();
        self.write()
            .add_raw_template(&name, &source)
            .map_err(|e| ViewError::Render {
                name,
                message: error_chain(&e),
            })
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.read().get_template_names().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tera> {
        self.overrides.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tera> {
        self.overrides.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn render_registered(tera: &Tera, name: &str, context: &Value) -> Result<String, ViewError> {
    let context = tera::Context::from_value(context.clone()).map_err(|e| ViewError::Render {
        name: name.to_string(),
        message: error_chain(&e),
    })?;
    tera.render(name, &context).map_err(|e| match &e.kind {
        tera::ErrorKind::TemplateNotFound(missing) => ViewError::NotFound(missing.clone()),
        _ => ViewError::Render {
            name: name.to_string(),
            message: error_chain(&e),
        },
    })
}

impl ViewEngine for BuiltinViews {
    fn render(&self, name: &str, context: &Value) -> Result<String, ViewError> {
        {
            let tera = self.read();
            if tera.get_template(name).is_ok() {
                return render_registered(&tera, name, context);
            }
        }

        match name {
            CONTENT_LIST => Ok(render_list(context)),
            CONTENT_DETAIL => Ok(render_detail(context)),
            CONTENT_FORM => Ok(render_form(context)),
            CONTENT_INDEX => Ok(render_index(context)),
            _ => Err(ViewError::NotFound(name.to_string())),
        }
    }
}

impl TemplateChecker for BuiltinViews {
    fn exists(&self, name: &str) -> bool {
        BUILTIN.contains(&name) || self.read().get_template(name).is_ok()
    }
}

fn load_error(path: &Path, err: std::io::Error) -> ViewError {
    ViewError::Load(format!("{}: {}", path.display(), err))
}

/// Tera keeps the useful detail in the source chain.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = std::error::Error::source(inner);
    }
    message
}

fn str_at<'a>(context: &'a Value, key: &str) -> &'a str {
    context.get(key).and_then(Value::as_str).unwrap_or("")
}

fn flag(context: &Value, section: &str, key: &str) -> bool {
    context
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn with_link_query(url: &str, context: &Value) -> String {
    let query = str_at(context, "link_query");
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

fn route(context: &Value, key: &str) -> String {
    context
        .get("routes")
        .and_then(|r| r.get(key))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn cell_html(value: Option<&Value>, renderer: Option<&str>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match (renderer, value) {
        (_, Value::Array(items)) => items
            .iter()
            .map(|item| {
                let text = value_to_string(item).unwrap_or_else(|| item.to_string());
                html::badge(&text, "neutral")
            })
            .collect::<Vec<_>>()
            .join(" "),
        (_, Value::Object(_)) => format!("<code>{}</code>", html_escape(&value.to_string())),
        (Some("status"), v) => html::badge(&value_to_string(v).unwrap_or_default(), "info"),
        (_, v) => html_escape(&value_to_string(v).unwrap_or_default()),
    }
}

fn render_list(context: &Value) -> String {
    let title = str_at(context, "title");
    let action_base = route(context, "action_base");
    let columns = context
        .get("columns")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let visible: Vec<&Value> = columns
        .iter()
        .filter(|c| c.get("default").and_then(Value::as_bool).unwrap_or(true))
        .collect();
    let items = context
        .get("items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let can_create = flag(context, "capabilities", "can_create");

    let mut body = String::new();
    if can_create {
        body.push_str(&html::link_button(
            "New",
            &with_link_query(&route(context, "new"), context),
            "primary",
        ));
    }

    if items.is_empty() {
        let action = can_create.then(|| with_link_query(&route(context, "new"), context));
        body.push_str(&html::empty_state(
            "No entries yet",
            "Nothing matches the current filters.",
            action.as_deref().map(|href| ("Create one", href)),
        ));
    } else {
        let mut headers: Vec<String> = visible
            .iter()
            .map(|c| str_at(c, "label").to_string())
            .collect();
        headers.push(String::new());

        let rows: Vec<Vec<String>> = items
            .iter()
            .map(|item| {
                let mut cells: Vec<String> = visible
                    .iter()
                    .map(|c| {
                        let field = str_at(c, "field");
                        let renderer = c.get("renderer").and_then(Value::as_str);
                        cell_html(item.get(field), renderer)
                    })
                    .collect();
                let id = item.get("id").and_then(value_to_string).unwrap_or_default();
                let href = with_link_query(&format!("{}/{}", action_base, id), context);
                cells.push(html::link_button("View", &href, "secondary"));
                cells
            })
            .collect();
        body.push_str(&html::table(str_at(context, "datatable_id"), &headers, &rows));
    }

    let total = context.get("total").and_then(Value::as_u64).unwrap_or(0);
    body.push_str(&format!(
        r#"<p class="list-meta" data-list-api="{}">{} total</p>"#,
        html_escape(str_at(context, "list_api")),
        total
    ));

    html::layout(title, str_at(context, "base_path"), &body)
}

fn render_detail(context: &Value) -> String {
    let title = str_at(context, "title");
    let item = context.get("resource_item").cloned().unwrap_or(Value::Null);
    let fields = context
        .get("fields")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let items: Vec<(String, String)> = fields
        .iter()
        .map(|f| {
            let name = str_at(f, "name");
            let url = item.get(format!("{}_url", name.trim_end_matches("_id")));
            let value = cell_html(item.get(name), None);
            let value = match url.and_then(Value::as_str) {
                Some(href) if name.ends_with("_id") => {
                    format!(r#"<a href="{}">{}</a>"#, html_escape(href), value)
                }
                _ => value,
            };
            (str_at(f, "label").to_string(), value)
        })
        .collect();

    let mut body = String::new();
    if context.get("create_success").and_then(Value::as_bool) == Some(true) {
        body.push_str(&html::notice("Created successfully", "success"));
    }
    if context.get("preview").and_then(Value::as_bool).unwrap_or(false) {
        body.push_str(&html::notice("Preview", "info"));
    }
    if let Some(translation) = context.get("translation")
        && translation.get("in_fallback_mode").and_then(Value::as_bool) == Some(true)
    {
        body.push_str(&html::notice(
            &format!(
                "Showing {} content; no {} translation exists yet",
                str_at(translation, "resolved_locale"),
                str_at(translation, "requested_locale"),
            ),
            "warning",
        ));
    }
    body.push_str(&html::card(title, &html::definition_list(&items)));

    let id = item.get("id").and_then(value_to_string).unwrap_or_default();
    let action_base = route(context, "action_base");
    if flag(context, "capabilities", "can_edit") {
        body.push_str(&html::link_button(
            "Edit",
            &with_link_query(&format!("{}/{}/edit", action_base, id), context),
            "primary",
        ));
    }
    if flag(context, "capabilities", "can_delete") {
        body.push_str(&format!(
            r#"<form method="post" action="{}" class="inline"><button type="submit" class="btn btn-danger">Delete</button></form>"#,
            html_escape(&with_link_query(&format!("{}/{}/delete", action_base, id), context))
        ));
    }
    body.push_str(&html::link_button(
        "Back",
        &with_link_query(&route(context, "index"), context),
        "secondary",
    ));

    html::layout(title, str_at(context, "base_path"), &body)
}

fn render_form(context: &Value) -> String {
    let title = str_at(context, "title");
    let mut body = String::new();

    if context.get("create_success").and_then(Value::as_bool) == Some(true) {
        body.push_str(&html::notice("Created successfully", "success"));
    }
    if let Some(translation) = context.get("translation")
        && translation.get("in_fallback_mode").and_then(Value::as_bool) == Some(true)
    {
        body.push_str(&html::notice(
            "This translation does not exist yet; saving is blocked until it is created",
            "warning",
        ));
    }
    let preview_url = str_at(context, "preview_url");
    if !preview_url.is_empty() {
        body.push_str(&html::link_button("Preview", preview_url, "secondary"));
    }
    body.push_str(&html::card(title, str_at(context, "form_html")));
    body.push_str(&html::link_button(
        "Cancel",
        &with_link_query(&route(context, "index"), context),
        "secondary",
    ));

    html::layout(title, str_at(context, "base_path"), &body)
}

fn render_index(context: &Value) -> String {
    let types = context
        .get("content_types")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let body = if types.is_empty() {
        html::empty_state("No content types", "Activate a content type to start editing.", None)
    } else {
        let rows: Vec<Vec<String>> = types
            .iter()
            .map(|ct| {
                let icon = str_at(ct, "icon");
                let icon_html = if icon.is_empty() {
                    String::new()
                } else {
                    format!(r#"<i class="icon icon-{}"></i> "#, html_escape(icon))
                };
                vec![
                    format!("{}{}", icon_html, html_escape(str_at(ct, "label"))),
                    html_escape(str_at(ct, "slug")),
                    html::link_button("Open", str_at(ct, "url"), "secondary"),
                ]
            })
            .collect();
        html::table(
            "content-types",
            &["Content type".to_string(), "Slug".to_string(), String::new()],
            &rows,
        )
    };
    html::layout(str_at(context, "title"), str_at(context, "base_path"), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_template_reports_missing() {
        let views = BuiltinViews::new();
        let err = views.render("resources/pages/list", &json!({})).unwrap_err();
        assert!(crate::templates::is_missing_template_error(&err.to_string()));
        assert!(!views.exists("resources/pages/list"));
        assert!(views.exists(CONTENT_LIST));
    }

    #[test]
    fn test_registered_template_renders_with_tera() {
        let views = BuiltinViews::new();
        views
            .register(
                "resources/pages/detail",
                "<h1>{{ title }}</h1><p>{{ resource_item.id }}</p>",
            )
            .unwrap();
        assert!(views.exists("resources/pages/detail"));

        let out = views
            .render(
                "resources/pages/detail",
                &json!({"title": "<Pages>", "resource_item": {"id": 7}}),
            )
            .unwrap();
        assert_eq!(out, "<h1>&lt;Pages&gt;</h1><p>7</p>");
    }

    #[test]
    fn test_registered_list_reaches_item_fields() {
        let views = BuiltinViews::new();
        views
            .register(
                "resources/posts/list",
                "<li>{{ items.0.title }}</li>{% for item in items %}<p>{{ item.title }}</p>{% endfor %}",
            )
            .unwrap();

        let out = views
            .render(
                "resources/posts/list",
                &json!({"items": [{"title": "First"}, {"title": "Second"}]}),
            )
            .unwrap();
        assert_eq!(out, "<li>First</li><p>First</p><p>Second</p>");
    }

    #[test]
    fn test_undefined_variable_is_not_a_missing_template() {
        let views = BuiltinViews::new();
        views.register("resources/pages/list", "{{ missing }}").unwrap();

        let err = views.render("resources/pages/list", &json!({})).unwrap_err();
        assert!(matches!(err, ViewError::Render { .. }));
        assert!(!crate::templates::is_missing_template_error(&err.to_string()));
    }

    #[test]
    fn test_missing_include_reports_missing() {
        let views = BuiltinViews::new();
        views
            .register("resources/pages/list", r#"{% include "partials/rows" %}"#)
            .unwrap();

        let err = views.render("resources/pages/list", &json!({})).unwrap_err();
        assert!(matches!(err, ViewError::NotFound(_)));
    }

    #[test]
    fn test_invalid_syntax_is_rejected_on_register() {
        let views = BuiltinViews::new();
        assert!(views.register("resources/pages/list", "{% for %}").is_err());
        assert!(!views.exists("resources/pages/list"));
    }

    #[test]
    fn test_list_renders_rows_and_links() {
        let views = BuiltinViews::new();
        let out = views
            .render(
                CONTENT_LIST,
                &json!({
                    "title": "Posts",
                    "base_path": "/admin",
                    "routes": {"action_base": "/admin/content/posts", "new": "/admin/content/posts/new"},
                    "link_query": "env=prod",
                    "columns": [{"field": "title", "label": "Title", "default": true}],
                    "items": [{"id": "p1", "title": "Hello"}],
                    "total": 1,
                    "datatable_id": "posts-datatable",
                    "capabilities": {"can_create": true},
                }),
            )
            .unwrap();
        assert!(out.contains("posts-datatable"));
        assert!(out.contains("Hello"));
        assert!(out.contains("/admin/content/posts/p1?env=prod"));
        assert!(out.contains("/admin/content/posts/new?env=prod"));
    }

    #[test]
    fn test_from_dir_loads_nested_templates() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("resources").join("pages");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("base.html"), "<main>{% block body %}{% endblock %}</main>").unwrap();
        std::fs::write(
            nested.join("list.html"),
            r#"{% extends "base" %}{% block body %}{{ total }} pages{% endblock %}"#,
        )
        .unwrap();
        std::fs::write(nested.join("notes.txt"), "ignored").unwrap();

        let views = BuiltinViews::from_dir(dir.path()).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(
            views.render("resources/pages/list", &json!({"total": 3})).unwrap(),
            "<main>3 pages</main>"
        );
    }

    #[test]
    fn test_from_dir_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuiltinViews::from_dir(&dir.path().join("nope")).err().unwrap();
        assert!(matches!(err, ViewError::Load(_)));
    }
}
