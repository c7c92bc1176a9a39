//! Per-request panel resolution.

use crate::query::{QueryParams, append_query};
use crate::request_context::build_admin_context;
use crate::state::ConsoleState;
use axum::http::request::Parts;
use quickstart_core::{
    AdminContext, AdminError, AdminResult, ContentType, split_panel_name, title_case,
};
use quickstart_panels::{Panel, resolve_content_type};
use serde_json::{Value, json};
use std::sync::Arc;

/// How the request reached the panel.
#[derive(Debug, Clone)]
pub enum PanelRoute {
    /// `/content/{name}`; the name comes from the path.
    Generic(String),
    /// A canonical per-panel route mounted at `path`.
    Canonical { slug: String, path: String },
    /// The JSON list API. Not subject to route ownership.
    Api(String),
}

impl PanelRoute {
    fn raw_name(&self) -> &str {
        match self {
            PanelRoute::Generic(name) | PanelRoute::Api(name) => name,
            PanelRoute::Canonical { slug, .. } => slug,
        }
    }
}

/// Everything a CRUD handler needs about its panel.
#[derive(Clone)]
pub struct PanelContext {
    pub panel: Arc<Panel>,
    /// Canonical (bare) panel name.
    pub name: String,
    pub content_type: Option<ContentType>,
    pub admin: AdminContext,
    pub query: QueryParams,
    /// Reached through `/content/{name}`.
    pub generic: bool,
    /// URL the panel's routes hang off (`/admin/content/pages`, `/admin/users`).
    pub action_base: String,
}

impl PanelContext {
    pub fn requested_locale(&self) -> Option<&str> {
        self.query.requested_locale()
    }

    /// Display name: the content type label, else the title-cased panel name.
    pub fn label(&self) -> String {
        match &self.content_type {
            Some(ct) => ct.label().to_string(),
            None => title_case(&self.name),
        }
    }

    pub fn ui_schema(&self) -> Option<&Value> {
        self.content_type.as_ref().and_then(|ct| ct.ui_schema.as_ref())
    }

    pub fn index_url(&self) -> String {
        self.action_base.clone()
    }

    pub fn new_url(&self) -> String {
        format!("{}/new", self.action_base)
    }

    pub fn detail_url(&self, id: &str) -> String {
        format!("{}/{}", self.action_base, urlencoding::encode(id))
    }

    pub fn edit_url(&self, id: &str) -> String {
        format!("{}/edit", self.detail_url(id))
    }

    pub fn delete_url(&self, id: &str) -> String {
        format!("{}/delete", self.detail_url(id))
    }

    /// `url` with the environment and requested locale carried over.
    pub fn carry(&self, url: &str) -> String {
        append_query(url, &self.query.carried_params())
    }

    /// Query string views append to their links (environment only).
    pub fn link_query(&self) -> String {
        append_query("", &self.query.environment_params())
            .trim_start_matches('?')
            .to_string()
    }

    /// `{slug, name, icon, status, panel_slug, translations}` or null.
    pub fn content_type_descriptor(&self) -> Value {
        match &self.content_type {
            Some(ct) => json!({
                "id": ct.id,
                "slug": ct.slug,
                "name": ct.label(),
                "icon": ct.icon(),
                "status": ct.status.as_str(),
                "panel_slug": ct.panel_slug(),
                "translations": ct.translations_enabled(),
                "workflow": ct.workflow(),
            }),
            None => Value::Null,
        }
    }
}

/// Resolve the panel, content type and admin context for a request.
///
/// Panels in custom route mode are only reachable through their own routes;
/// reaching one through `/content/{name}` is reported as not found.
pub async fn resolve_panel_context(
    state: &ConsoleState,
    parts: &Parts,
    route: &PanelRoute,
) -> AdminResult<PanelContext> {
    let (bare, suffix_env) = split_panel_name(route.raw_name());
    if bare.is_empty() {
        return Err(AdminError::not_found("panel name is required"));
    }

    let query = QueryParams::from_uri(&parts.uri);
    let mut admin = build_admin_context(parts, &query, state.config());
    if admin.environment.is_empty()
        && let Some(env) = suffix_env
    {
        admin.environment = env.to_string();
    }

    let panels = state.panels();
    let panel = match panels.get(bare, admin.environment()) {
        Some(panel) => panel,
        None => {
            // The name may be a content type presenting under another panel slug.
            let via_content_type = match state.content_types() {
                Some(service) => resolve_content_type(service, &admin, bare)
                    .await
                    .ok()
                    .flatten()
                    .and_then(|ct| panels.get(ct.panel_slug(), admin.environment())),
                None => None,
            };
            via_content_type.ok_or_else(|| AdminError::panel_not_found(bare))?
        }
    };

    let generic = matches!(route, PanelRoute::Generic(_));
    if generic && panel.schema().is_custom_owned() {
        tracing::debug!(panel = %panel.name(), "Custom-owned panel hidden from generic dispatch");
        return Err(AdminError::panel_not_found(bare));
    }

    let content_type = match state.content_types() {
        Some(service) => match resolve_content_type(service, &admin, bare).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(panel = %bare, error = %err, "Content type lookup failed");
                None
            }
        },
        None => None,
    };

    let action_base = match route {
        PanelRoute::Generic(_) | PanelRoute::Api(_) => {
            format!("{}/content/{}", state.base_path(), bare)
        }
        PanelRoute::Canonical { path, .. } => path.trim_end_matches('/').to_string(),
    };

    Ok(PanelContext {
        name: panel.name().to_string(),
        panel,
        content_type,
        admin,
        query,
        generic,
        action_base,
    })
}
