//! JSON API: panel list data and the content-type builder endpoints.

use crate::columns;
use crate::error::ConsoleError;
use crate::panel_context::{PanelRoute, resolve_panel_context};
use crate::query::QueryParams;
use crate::request_context::build_admin_context;
use crate::state::ConsoleState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Router, response::IntoResponse, response::Response};
use quickstart_core::record;
use quickstart_core::{
    AdminContext, AdminError, AdminResult, ContentType, ContentTypeStatus, Permissions,
    text_codes,
};
use quickstart_panels::ContentTypeService;
use quickstart_policy::{CrudAction, features};
use quickstart_schema::content_type_key;
use quickstart_schema::diff::empty_schema;
use serde::Deserialize;
use serde_json::{Value, json};

type ApiResult = Result<Response, ConsoleError>;

/// Resource name the builder endpoints are guarded under.
pub const CONTENT_TYPES_RESOURCE: &str = "content_types";

pub(crate) fn api_router(base_path: &str) -> Router<ConsoleState> {
    let api = format!("{}/api", base_path);
    Router::new()
        .route(&format!("{}/panels/{{name}}", api), get(list_records))
        .route(&format!("{}/content_types", api), get(list_content_types))
        .route(
            &format!("{}/content_types/compatibility", api),
            post(check_compatibility),
        )
        .route(
            &format!("{}/content_types/{{slug}}/status", api),
            post(update_status),
        )
        .route(
            &format!("{}/content_types/{{slug}}/versions", api),
            get(list_versions),
        )
}

/// `GET /api/panels/{name}`: `{records, total, page, per_page}`.
async fn list_records(
    State(state): State<ConsoleState>,
    Path(name): Path<String>,
    req: Request,
) -> ApiResult {
    let (parts, _) = req.into_parts();
    let pctx = resolve_panel_context(&state, &parts, &PanelRoute::Api(name)).await?;
    state
        .guard()
        .require(
            &pctx.admin,
            &pctx.name,
            &pctx.panel.schema().permissions,
            CrudAction::Read,
        )
        .await?;

    let filters = columns::content_entry_filters(pctx.panel.schema());
    let opts = pctx.query.list_options(&filters);
    let (records, total) = pctx.panel.list(&pctx.admin, &opts).await?;
    let records: Vec<Value> = records
        .iter()
        .map(|r| Value::Object(record::presented(r)))
        .collect();

    Ok(Json(json!({
        "records": records,
        "total": total,
        "page": opts.page,
        "per_page": opts.per_page,
    }))
    .into_response())
}

fn builder_permissions() -> Permissions {
    Permissions {
        view: format!("{}.view", CONTENT_TYPES_RESOURCE),
        create: format!("{}.create", CONTENT_TYPES_RESOURCE),
        edit: format!("{}.edit", CONTENT_TYPES_RESOURCE),
        delete: format!("{}.delete", CONTENT_TYPES_RESOURCE),
    }
}

/// Feature gate, guard and service availability shared by builder endpoints.
async fn builder_context<'a>(
    state: &'a ConsoleState,
    parts: &Parts,
    action: CrudAction,
) -> AdminResult<(AdminContext, &'a dyn ContentTypeService)> {
    state.features().require(features::CONTENT_TYPE_BUILDER)?;
    let query = QueryParams::from_uri(&parts.uri);
    let admin = build_admin_context(parts, &query, state.config());
    state
        .guard()
        .require(&admin, CONTENT_TYPES_RESOURCE, &builder_permissions(), action)
        .await?;
    let service = state
        .content_types()
        .ok_or_else(AdminError::content_service_unavailable)?;
    Ok((admin, service))
}

async fn read_json(state: &ConsoleState, body: axum::body::Body) -> AdminResult<Value> {
    let bytes: Bytes = axum::body::to_bytes(body, state.config().server.body_limit_bytes)
        .await
        .map_err(|err| AdminError::invalid_json(format!("failed to read request body: {}", err)))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(&bytes).map_err(|err| AdminError::invalid_json(err.to_string()))
}

/// Find a content type by slug, falling back to an id match.
async fn find_content_type(
    service: &dyn ContentTypeService,
    ctx: &AdminContext,
    key: &str,
) -> AdminResult<Option<ContentType>> {
    if let Some(ct) = service.content_type_by_slug(ctx, key).await? {
        return Ok(Some(ct));
    }
    Ok(service
        .content_types(ctx)
        .await?
        .into_iter()
        .find(|ct| ct.id == key || ct.key() == key))
}

/// `GET /api/content_types`.
async fn list_content_types(State(state): State<ConsoleState>, req: Request) -> ApiResult {
    let (parts, _) = req.into_parts();
    let (admin, service) = builder_context(&state, &parts, CrudAction::Read).await?;
    let types = service.content_types(&admin).await?;
    Ok(Json(json!({ "content_types": types, "total": types.len() })).into_response())
}

#[derive(Debug, Default, Deserialize)]
struct CompatibilityRequest {
    #[serde(default)]
    content_type_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    schema: Option<Value>,
    #[serde(default)]
    ui_schema: Option<Value>,
}

/// `POST /api/content_types/compatibility`: compare the proposed schema with
/// the current one and stage it as pending.
async fn check_compatibility(State(state): State<ConsoleState>, req: Request) -> ApiResult {
    let (parts, body) = req.into_parts();
    let (admin, service) = builder_context(&state, &parts, CrudAction::Edit).await?;

    let payload: CompatibilityRequest = serde_json::from_value(read_json(&state, body).await?)
        .map_err(|err| AdminError::invalid_json(err.to_string()))?;
    let Some(requested_key) = content_type_key(
        payload.content_type_id.as_deref(),
        payload.id.as_deref(),
        payload.slug.as_deref(),
    )
    .map(str::to_string) else {
        return Err(AdminError::type_required().into());
    };
    let Some(proposed) = payload.schema.filter(|s| !s.is_null()) else {
        return Err(AdminError::validation(
            text_codes::SCHEMA_REQUIRED,
            "schema is required",
        )
        .into());
    };

    let current = find_content_type(service, &admin, &requested_key).await?;
    let key = current
        .as_ref()
        .map(|ct| ct.key().to_string())
        .unwrap_or(requested_key);
    let current_schema = current
        .as_ref()
        .map(|ct| ct.schema.clone())
        .unwrap_or_else(empty_schema);

    let actor = Some(admin.user_id.as_str()).filter(|u| !u.is_empty());
    let report = state.lifecycle().check_compatibility(
        &key,
        &current_schema,
        proposed,
        payload.ui_schema,
        actor,
    );
    tracing::info!(
        content_type = %key,
        compatible = report.compatible,
        breaking = report.breaking_changes.len(),
        "Schema compatibility checked"
    );

    Ok(Json(json!({
        "content_type": key,
        "compatible": report.compatible,
        "breaking_changes": report.breaking_changes,
        "warnings": report.warnings,
    }))
    .into_response())
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: String,
}

/// `POST /api/content_types/{slug}/status`: persist the status; activation
/// records a schema version.
async fn update_status(
    State(state): State<ConsoleState>,
    Path(slug): Path<String>,
    req: Request,
) -> ApiResult {
    let (parts, body) = req.into_parts();
    let (admin, service) = builder_context(&state, &parts, CrudAction::Edit).await?;
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(AdminError::slug_required().into());
    }

    let payload: StatusRequest = serde_json::from_value(read_json(&state, body).await?)
        .map_err(|err| AdminError::invalid_json(err.to_string()))?;
    let status = ContentTypeStatus::parse(&payload.status).ok_or_else(|| {
        AdminError::validation(
            text_codes::INVALID_FORM,
            format!("unknown content type status {:?}", payload.status),
        )
        .with_metadata("field", "status")
    })?;

    let mut content_type = find_content_type(service, &admin, slug)
        .await?
        .ok_or_else(|| AdminError::not_found(format!("content type {} not found", slug)))?;
    content_type.status = status;
    if !admin.user_id.is_empty() {
        content_type.updated_by = Some(admin.user_id.clone());
    }
    let saved = service.save_content_type(&admin, content_type).await?;
    let version = state
        .lifecycle()
        .on_status_change(saved.key(), &saved, status);
    tracing::info!(content_type = %saved.slug, status = status.as_str(), "Content type status changed");

    Ok(Json(json!({ "content_type": saved, "version": version })).into_response())
}

/// `GET /api/content_types/{slug}/versions`: newest first.
async fn list_versions(
    State(state): State<ConsoleState>,
    Path(slug): Path<String>,
    req: Request,
) -> ApiResult {
    let (parts, _) = req.into_parts();
    let (admin, service) = builder_context(&state, &parts, CrudAction::Read).await?;
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(AdminError::slug_required().into());
    }
    let key = find_content_type(service, &admin, slug)
        .await?
        .map(|ct| ct.key().to_string())
        .unwrap_or_else(|| slug.to_string());
    let versions = state.lifecycle().list_versions(&key);
    Ok(Json(json!({ "content_type": key, "versions": versions })).into_response())
}
