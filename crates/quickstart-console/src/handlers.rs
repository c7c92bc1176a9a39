//! CRUD handler pipeline.
//!
//! Every operation resolves the panel context, checks the guard, runs one
//! repository call under the request's admin context, then renders a view or
//! redirects. Repository errors are returned unchanged.

use crate::columns::{self, ListColumn};
use crate::error::ConsoleError;
use crate::form::{self, effective_schema, require_schema};
use crate::panel_context::{PanelContext, PanelRoute, resolve_panel_context};
use crate::payload::parse_payload;
use crate::query::{QueryParams, append_query};
use crate::relations::{attach_links, resolve_links};
use crate::request_context::build_admin_context;
use crate::state::ConsoleState;
use crate::templates::{normalize_slug, render_with_fallback};
use crate::translation::{TranslationState, guard_translation_update};
use crate::views::{CONTENT_DETAIL, CONTENT_FORM, CONTENT_INDEX, CONTENT_LIST};
use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use quickstart_core::record::{self, Record};
use quickstart_core::{AdminError, AdminResult, EntryMode, Field, title_case};
use quickstart_panels::active_content_types;
use quickstart_policy::{CrudAction, features};
use serde_json::{Map, Value, json};

pub type HandlerResult = Result<Response, ConsoleError>;

/// 302 to `location`.
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

async fn require(state: &ConsoleState, pctx: &PanelContext, action: CrudAction) -> AdminResult<()> {
    state
        .guard()
        .require(&pctx.admin, &pctx.name, &pctx.panel.schema().permissions, action)
        .await
}

/// `{can_view, can_create, can_edit, can_delete}` for the current actor.
async fn capabilities(state: &ConsoleState, pctx: &PanelContext) -> Value {
    let mut caps = Map::new();
    for (key, action) in [
        ("can_view", CrudAction::Read),
        ("can_create", CrudAction::Create),
        ("can_edit", CrudAction::Edit),
        ("can_delete", CrudAction::Delete),
    ] {
        let allowed = require(state, pctx, action).await.is_ok();
        caps.insert(key.to_string(), Value::Bool(allowed));
    }
    Value::Object(caps)
}

/// Keys every panel view shares.
async fn base_view(state: &ConsoleState, pctx: &PanelContext, title: String) -> Map<String, Value> {
    let mut view = Map::new();
    view.insert("title".into(), Value::String(title));
    view.insert("base_path".into(), json!(state.base_path()));
    view.insert("panel".into(), json!(pctx.name));
    view.insert("panel_label".into(), json!(pctx.label()));
    view.insert(
        "routes".into(),
        json!({
            "index": pctx.index_url(),
            "new": pctx.new_url(),
            "create": pctx.index_url(),
            "action_base": pctx.action_base,
        }),
    );
    view.insert("action_base".into(), json!(pctx.action_base));
    view.insert("link_query".into(), json!(pctx.link_query()));
    view.insert("environment".into(), json!(pctx.admin.environment));
    view.insert("locale".into(), json!(pctx.admin.locale));
    view.insert("content_type".into(), pctx.content_type_descriptor());
    view.insert("capabilities".into(), capabilities(state, pctx).await);
    view
}

fn render(state: &ConsoleState, pctx: &PanelContext, fallback: &str, view: Map<String, Value>) -> HandlerResult {
    let html = render_with_fallback(
        state.views(),
        state.template_checker(),
        &pctx.name,
        fallback,
        &Value::Object(view),
    )?;
    Ok(Html(html).into_response())
}

async fn read_body(state: &ConsoleState, body: Body) -> AdminResult<Bytes> {
    axum::body::to_bytes(body, state.config().server.body_limit_bytes)
        .await
        .map_err(|err| AdminError::invalid_form(format!("failed to read request body: {}", err)))
}

fn content_type_header(parts: &axum::http::request::Parts) -> Option<&str> {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Columns with block icons attached when a column needs them.
async fn list_columns(state: &ConsoleState, pctx: &PanelContext) -> Vec<ListColumn> {
    let mut columns = columns::content_entry_columns(
        pctx.panel.schema(),
        pctx.ui_schema(),
        &state.config().content.default_renderers,
    );
    if columns::needs_block_icons(&columns) {
        let icons = columns::block_icon_map(
            state.panels(),
            &pctx.admin,
            &state.config().content.block_definitions_panel,
        )
        .await;
        columns::attach_block_icons(&mut columns, &icons);
    }
    columns
}

/// `GET <panel>`: the list, or the current user's record for
/// `detail_current_user` panels.
pub async fn list_page(state: ConsoleState, route: PanelRoute, req: Request) -> HandlerResult {
    let (parts, _) = req.into_parts();
    let pctx = resolve_panel_context(&state, &parts, &route).await?;

    if pctx.panel.schema().entry_mode == EntryMode::DetailCurrentUser {
        let user_id = pctx.admin.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(AdminError::forbidden("no current user for this panel").into());
        }
        return detail_view(&state, &pctx, &user_id).await;
    }

    require(&state, &pctx, CrudAction::Read).await?;

    let columns = list_columns(&state, &pctx).await;
    let filters = columns::content_entry_filters(pctx.panel.schema());
    let opts = pctx.query.list_options(&filters);
    let (items, total) = pctx.panel.list(&pctx.admin, &opts).await?;
    tracing::debug!(panel = %pctx.name, total, page = opts.page, "Listed records");

    let items: Vec<Value> = items
        .iter()
        .map(|item| Value::Object(record::presented(item)))
        .collect();

    let mut view = base_view(&state, &pctx, pctx.label()).await;
    view.insert("columns".into(), serde_json::to_value(&columns).map_err(AdminError::from)?);
    view.insert("filters".into(), serde_json::to_value(&filters).map_err(AdminError::from)?);
    view.insert("items".into(), Value::Array(items));
    view.insert("total".into(), json!(total));
    view.insert("page".into(), json!(opts.page));
    view.insert("per_page".into(), json!(opts.per_page));
    view.insert("sort".into(), json!(pctx.query.get("sort")));
    view.insert("search".into(), json!(opts.search));
    view.insert(
        "datatable_id".into(),
        json!(format!("{}-datatable", normalize_slug(&pctx.name))),
    );
    view.insert(
        "list_api".into(),
        json!(append_query(
            &format!("{}/api/panels/{}", state.base_path(), pctx.name),
            &pctx.query.environment_params(),
        )),
    );
    render(&state, &pctx, CONTENT_LIST, view)
}

/// `GET <panel>/new`.
pub async fn new_page(state: ConsoleState, route: PanelRoute, req: Request) -> HandlerResult {
    let (parts, _) = req.into_parts();
    let pctx = resolve_panel_context(&state, &parts, &route).await?;
    require_schema(&pctx)?;
    require(&state, &pctx, CrudAction::Create).await?;

    let mut view = base_view(&state, &pctx, format!("New {}", pctx.label())).await;
    view.extend(form::form_view(&state, &pctx, None).await?);
    render(&state, &pctx, CONTENT_FORM, view)
}

/// Where to land after a create.
fn created_location(state: &ConsoleState, pctx: &PanelContext, id: Option<&str>) -> String {
    let Some(id) = id else {
        return pctx.carry(&pctx.index_url());
    };
    let content = &state.config().content;
    if content.redirects_to_detail_after_create(&pctx.name) {
        return append_query(&pctx.carry(&pctx.detail_url(id)), &[("created", "1")]);
    }
    let edit = pctx.carry(&pctx.edit_url(id));
    if content.marks_edit_after_create(&pctx.name) {
        append_query(&edit, &[("created", "1")])
    } else {
        edit
    }
}

/// `POST <panel>`.
pub async fn create_entry(state: ConsoleState, route: PanelRoute, req: Request) -> HandlerResult {
    let (parts, body) = req.into_parts();
    let pctx = resolve_panel_context(&state, &parts, &route).await?;
    let schema = require_schema(&pctx)?;
    require(&state, &pctx, CrudAction::Create).await?;

    let body = read_body(&state, body).await?;
    let record = parse_payload(content_type_header(&parts), body, Some(&schema)).await?;
    let created = pctx.panel.create(&pctx.admin, record).await?;
    let id = record::record_id(&created);
    tracing::info!(panel = %pctx.name, id = ?id, environment = %pctx.admin.environment, "Created record");

    Ok(redirect(&created_location(&state, &pctx, id.as_deref())))
}

/// `GET <panel>/{id}`.
pub async fn detail_page(state: ConsoleState, route: PanelRoute, id: String, req: Request) -> HandlerResult {
    let (parts, _) = req.into_parts();
    let pctx = resolve_panel_context(&state, &parts, &route).await?;
    detail_view(&state, &pctx, &id).await
}

fn detail_fields(pctx: &PanelContext, item: &Record) -> Vec<Field> {
    let schema = pctx.panel.schema();
    let declared = if schema.detail_fields.is_empty() {
        &schema.list_fields
    } else {
        &schema.detail_fields
    };
    if !declared.is_empty() {
        return declared.iter().filter(|f| !f.hidden).cloned().collect();
    }
    item.keys()
        .filter(|k| !k.ends_with("_url") && k.as_str() != "links")
        .map(|k| Field::new(k.as_str(), "text"))
        .collect()
}

async fn detail_view(state: &ConsoleState, pctx: &PanelContext, id: &str) -> HandlerResult {
    require(state, pctx, CrudAction::Read).await?;
    let item = pctx.panel.get(&pctx.admin, id).await?;

    let mut presented = record::presented(&item);
    let links = resolve_links(
        state.panels(),
        &pctx.name,
        pctx.panel.schema(),
        &item,
        pctx.admin.environment(),
        state.base_path(),
    );
    attach_links(&mut presented, &links);

    let previewing = match (state.preview(), pctx.query.get("preview_token")) {
        (Some(service), Some(token)) => service
            .validate(token)
            .await
            .is_some_and(|grant| grant.panel == pctx.name && grant.id == id),
        _ => false,
    };

    let fields: Vec<Value> = detail_fields(pctx, &presented)
        .iter()
        .map(|f| {
            let label = if f.label.is_empty() { title_case(&f.name) } else { f.label.clone() };
            json!({"name": f.name, "label": label})
        })
        .collect();

    let title = record::string_field(&presented, "title")
        .or_else(|| record::string_field(&presented, "name"))
        .unwrap_or_else(|| format!("{} {}", pctx.label(), id));

    let mut view = base_view(state, pctx, title).await;
    view.insert("fields".into(), Value::Array(fields));
    view.insert("resource_item".into(), Value::Object(presented));
    view.insert("preview".into(), Value::Bool(previewing));
    view.insert("create_success".into(), Value::Bool(pctx.query.created_marker()));
    if state.features().is_enabled(features::TRANSLATIONS) {
        view.insert(
            "translation".into(),
            serde_json::to_value(TranslationState::from_record(&item)).map_err(AdminError::from)?,
        );
    }
    render(state, pctx, CONTENT_DETAIL, view)
}

/// `GET <panel>/{id}/edit`.
pub async fn edit_page(state: ConsoleState, route: PanelRoute, id: String, req: Request) -> HandlerResult {
    let (parts, _) = req.into_parts();
    let pctx = resolve_panel_context(&state, &parts, &route).await?;
    require_schema(&pctx)?;
    require(&state, &pctx, CrudAction::Edit).await?;

    let item = pctx.panel.get(&pctx.admin, &id).await?;
    let mut view = base_view(&state, &pctx, format!("Edit {}", pctx.label())).await;
    view.extend(form::form_view(&state, &pctx, Some(&item)).await?);
    render(&state, &pctx, CONTENT_FORM, view)
}

/// `POST <panel>/{id}`.
pub async fn update_entry(state: ConsoleState, route: PanelRoute, id: String, req: Request) -> HandlerResult {
    let (parts, body) = req.into_parts();
    let pctx = resolve_panel_context(&state, &parts, &route).await?;
    require(&state, &pctx, CrudAction::Edit).await?;

    let existing = pctx.panel.get(&pctx.admin, &id).await?;
    guard_translation_update(&pctx.name, &id, &existing)?;

    let schema = effective_schema(pctx.panel.schema(), pctx.content_type.as_ref());
    let body = read_body(&state, body).await?;
    let record = parse_payload(content_type_header(&parts), body, schema.as_ref()).await?;
    let updated = pctx.panel.update(&pctx.admin, &id, record).await?;
    tracing::info!(panel = %pctx.name, id = %id, "Updated record");

    let location = match record::record_id(&updated) {
        Some(updated_id) => pctx.carry(&pctx.edit_url(&updated_id)),
        None => pctx.carry(&pctx.index_url()),
    };
    Ok(redirect(&location))
}

/// `POST <panel>/{id}/delete`.
pub async fn delete_entry(state: ConsoleState, route: PanelRoute, id: String, req: Request) -> HandlerResult {
    let (parts, _) = req.into_parts();
    let pctx = resolve_panel_context(&state, &parts, &route).await?;
    require(&state, &pctx, CrudAction::Delete).await?;

    pctx.panel.delete(&pctx.admin, &id).await?;
    tracing::info!(panel = %pctx.name, id = %id, "Deleted record");
    Ok(redirect(&pctx.carry(&pctx.index_url())))
}

/// `GET {base}/content`: active content types with their list URLs.
pub async fn content_index(state: ConsoleState, req: Request) -> HandlerResult {
    let (parts, _) = req.into_parts();
    let query = QueryParams::from_uri(&parts.uri);
    let admin = build_admin_context(&parts, &query, state.config());

    let types = match state.content_types() {
        Some(service) => active_content_types(service, &admin).await?,
        None => Vec::new(),
    };
    let entries: Vec<Value> = types
        .iter()
        .map(|ct| {
            let url = append_query(
                &format!("{}/content/{}", state.base_path(), ct.panel_slug()),
                &query.environment_params(),
            );
            json!({
                "slug": ct.slug,
                "label": ct.label(),
                "icon": ct.icon(),
                "panel_slug": ct.panel_slug(),
                "url": url,
            })
        })
        .collect();

    let view = json!({
        "title": "Content",
        "base_path": state.base_path(),
        "content_types": entries,
        "environment": admin.environment,
    });
    Ok(Html(state.views().render(CONTENT_INDEX, &view)?).into_response())
}
