//! Route definitions for the console.
//!
//! Three route families share one router: the generic `/content/{name}`
//! dispatcher, canonical per-panel routes at the paths the URL resolver
//! reports, and alias redirects (`/pages` to `/content/pages`).

use crate::api;
use crate::auth::actor_middleware;
use crate::handlers::{self, HandlerResult, redirect};
use crate::panel_context::PanelRoute;
use crate::query::QueryParams;
use crate::request_context::build_admin_context;
use crate::state::ConsoleState;
use axum::extract::{Extension, Path, Request, State};
use axum::routing::{get, post};
use axum::{Router, middleware};
use quickstart_core::{EntryMode, canonical_panel_name};
use quickstart_panels::{PanelRegistry, resolve_alias};
use std::collections::{HashMap, HashSet};
use tower_http::trace::TraceLayer;

/// Maps admin route keys to concrete paths.
pub trait UrlResolver: Send + Sync {
    fn resolve(&self, route_key: &str) -> Option<String>;
}

/// Resolver backed by a fixed key → path table.
#[derive(Debug, Clone, Default)]
pub struct StaticUrlResolver {
    routes: HashMap<String, String>,
}

impl StaticUrlResolver {
    pub fn new(routes: HashMap<String, String>) -> Self {
        Self { routes }
    }
}

impl UrlResolver for StaticUrlResolver {
    fn resolve(&self, route_key: &str) -> Option<String> {
        self.routes.get(route_key).cloned()
    }
}

/// A canonical panel route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    pub panel: String,
    pub path: String,
    pub entry_mode: EntryMode,
}

fn is_template_path(path: &str) -> bool {
    path.contains([':', '*', '{'])
}

/// Concrete route path for `name`, trying the name as-is, then its hyphen and
/// underscore variants. Template routes are rejected.
pub fn canonical_path(resolver: &dyn UrlResolver, name: &str) -> Option<String> {
    let mut keys = vec![name.to_string()];
    for variant in [name.replace('_', "-"), name.replace('-', "_")] {
        if !keys.contains(&variant) {
            keys.push(variant);
        }
    }
    keys.iter()
        .filter_map(|key| resolver.resolve(key))
        .map(|path| path.trim().trim_end_matches('/').to_string())
        .find(|path| path.starts_with('/') && !is_template_path(path))
}

/// Paths owned by the generic dispatcher and the JSON API.
fn is_reserved_path(base_path: &str, path: &str) -> bool {
    let content = format!("{}/content", base_path);
    let api = format!("{}/api", base_path);
    path == base_path
        || path == content
        || path.starts_with(&format!("{}/", content))
        || path == api
        || path.starts_with(&format!("{}/", api))
}

/// One binding per routable panel, sorted by panel name, deduplicated by path.
/// Custom-owned panels are skipped; their owners mount them with
/// [`panel_router`].
pub fn canonical_route_bindings(
    registry: &PanelRegistry,
    resolver: &dyn UrlResolver,
    base_path: &str,
) -> Vec<RouteBinding> {
    let mut panels = registry.all();
    panels.sort_by(|a, b| a.qualified_name().cmp(&b.qualified_name()));

    let mut seen = HashSet::new();
    let mut bindings = Vec::new();
    for panel in panels {
        if panel.schema().is_custom_owned() {
            continue;
        }
        let name = canonical_panel_name(panel.name());
        let Some(path) = canonical_path(resolver, name) else {
            continue;
        };
        if is_reserved_path(base_path, &path) {
            tracing::warn!(panel = %name, path = %path, "Canonical path collides with console routes");
            continue;
        }
        if !seen.insert(path.clone()) {
            continue;
        }
        bindings.push(RouteBinding {
            panel: name.to_string(),
            path,
            entry_mode: panel.schema().entry_mode,
        });
    }
    bindings
}

/// Build the console router: generic content routes, the JSON API, canonical
/// panel routes and alias redirects.
pub fn console_router(state: ConsoleState) -> Router {
    let base = state.base_path().to_string();
    let content = format!("{}/content", base);

    let mut router = Router::new()
        .route(&content, get(content_index))
        .route(
            &format!("{}/{{name}}", content),
            get(generic_list).post(generic_create),
        )
        .route(&format!("{}/{{name}}/new", content), get(generic_new))
        .route(
            &format!("{}/{{name}}/{{id}}", content),
            get(generic_detail).post(generic_update),
        )
        .route(&format!("{}/{{name}}/{{id}}/edit", content), get(generic_edit))
        .route(
            &format!("{}/{{name}}/{{id}}/delete", content),
            post(generic_delete),
        )
        .merge(api::api_router(&base));

    let bindings = canonical_route_bindings(state.panels(), state.url_resolver(), &base);
    let bound: HashSet<&str> = bindings.iter().map(|b| b.path.as_str()).collect();
    for binding in &bindings {
        tracing::debug!(panel = %binding.panel, path = %binding.path, "Binding canonical panel route");
        router = router.merge(canonical_routes(&binding.panel, &binding.path));
    }

    let mut aliases = HashSet::new();
    for alias in &state.config().content.aliases {
        let alias = alias.trim().trim_matches('/');
        if alias.is_empty() || alias.contains('/') || is_template_path(alias) {
            continue;
        }
        let path = format!("{}/{}", base, alias);
        if is_reserved_path(&base, &path) || bound.contains(path.as_str()) || !aliases.insert(path.clone()) {
            tracing::debug!(alias = %alias, "Alias shadowed by another route");
            continue;
        }
        router = router.merge(alias_routes(alias, &path));
    }

    router
        .layer(middleware::from_fn(actor_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes for one panel at `path`, for panels whose routes are owned by the
/// application (`ui_route_mode: custom`). Merge the result into the app router.
pub fn panel_router(state: ConsoleState, slug: &str, path: &str) -> Router {
    canonical_routes(canonical_panel_name(slug), path.trim_end_matches('/'))
        .layer(middleware::from_fn(actor_middleware))
        .with_state(state)
}

fn canonical_routes(slug: &str, path: &str) -> Router<ConsoleState> {
    let route = PanelRoute::Canonical {
        slug: slug.to_string(),
        path: path.to_string(),
    };
    Router::new()
        .route(path, get(canonical_list).post(canonical_create))
        .route(&format!("{}/new", path), get(canonical_new))
        .route(
            &format!("{}/{{id}}", path),
            get(canonical_detail).post(canonical_update),
        )
        .route(&format!("{}/{{id}}/edit", path), get(canonical_edit))
        .route(&format!("{}/{{id}}/delete", path), post(canonical_delete))
        .layer(Extension(route))
}

// Generic dispatcher

async fn content_index(State(state): State<ConsoleState>, req: Request) -> HandlerResult {
    handlers::content_index(state, req).await
}

async fn generic_list(
    State(state): State<ConsoleState>,
    Path(name): Path<String>,
    req: Request,
) -> HandlerResult {
    handlers::list_page(state, PanelRoute::Generic(name), req).await
}

async fn generic_new(
    State(state): State<ConsoleState>,
    Path(name): Path<String>,
    req: Request,
) -> HandlerResult {
    handlers::new_page(state, PanelRoute::Generic(name), req).await
}

async fn generic_create(
    State(state): State<ConsoleState>,
    Path(name): Path<String>,
    req: Request,
) -> HandlerResult {
    handlers::create_entry(state, PanelRoute::Generic(name), req).await
}

async fn generic_detail(
    State(state): State<ConsoleState>,
    Path((name, id)): Path<(String, String)>,
    req: Request,
) -> HandlerResult {
    handlers::detail_page(state, PanelRoute::Generic(name), id, req).await
}

async fn generic_edit(
    State(state): State<ConsoleState>,
    Path((name, id)): Path<(String, String)>,
    req: Request,
) -> HandlerResult {
    handlers::edit_page(state, PanelRoute::Generic(name), id, req).await
}

async fn generic_update(
    State(state): State<ConsoleState>,
    Path((name, id)): Path<(String, String)>,
    req: Request,
) -> HandlerResult {
    handlers::update_entry(state, PanelRoute::Generic(name), id, req).await
}

async fn generic_delete(
    State(state): State<ConsoleState>,
    Path((name, id)): Path<(String, String)>,
    req: Request,
) -> HandlerResult {
    handlers::delete_entry(state, PanelRoute::Generic(name), id, req).await
}

// Canonical panel routes; the panel comes from the route extension.

async fn canonical_list(
    State(state): State<ConsoleState>,
    Extension(route): Extension<PanelRoute>,
    req: Request,
) -> HandlerResult {
    handlers::list_page(state, route, req).await
}

async fn canonical_new(
    State(state): State<ConsoleState>,
    Extension(route): Extension<PanelRoute>,
    req: Request,
) -> HandlerResult {
    handlers::new_page(state, route, req).await
}

async fn canonical_create(
    State(state): State<ConsoleState>,
    Extension(route): Extension<PanelRoute>,
    req: Request,
) -> HandlerResult {
    handlers::create_entry(state, route, req).await
}

async fn canonical_detail(
    State(state): State<ConsoleState>,
    Extension(route): Extension<PanelRoute>,
    Path(id): Path<String>,
    req: Request,
) -> HandlerResult {
    handlers::detail_page(state, route, id, req).await
}

async fn canonical_edit(
    State(state): State<ConsoleState>,
    Extension(route): Extension<PanelRoute>,
    Path(id): Path<String>,
    req: Request,
) -> HandlerResult {
    handlers::edit_page(state, route, id, req).await
}

async fn canonical_update(
    State(state): State<ConsoleState>,
    Extension(route): Extension<PanelRoute>,
    Path(id): Path<String>,
    req: Request,
) -> HandlerResult {
    handlers::update_entry(state, route, id, req).await
}

async fn canonical_delete(
    State(state): State<ConsoleState>,
    Extension(route): Extension<PanelRoute>,
    Path(id): Path<String>,
    req: Request,
) -> HandlerResult {
    handlers::delete_entry(state, route, id, req).await
}

// Alias redirects

#[derive(Debug, Clone)]
struct AliasRoute(String);

fn alias_routes(alias: &str, path: &str) -> Router<ConsoleState> {
    Router::new()
        .route(path, get(alias_root))
        .route(&format!("{}/{{*path}}", path), get(alias_suffix))
        .layer(Extension(AliasRoute(alias.to_string())))
}

async fn alias_root(
    State(state): State<ConsoleState>,
    Extension(alias): Extension<AliasRoute>,
    req: Request,
) -> HandlerResult {
    alias_redirect(state, alias.0, None, req).await
}

async fn alias_suffix(
    State(state): State<ConsoleState>,
    Extension(alias): Extension<AliasRoute>,
    Path(suffix): Path<String>,
    req: Request,
) -> HandlerResult {
    alias_redirect(state, alias.0, Some(suffix), req).await
}

/// 302 to `{base}/content/<resolved>[/suffix][?query]`. An alias that resolves
/// to no content type redirects under its own name.
async fn alias_redirect(
    state: ConsoleState,
    alias: String,
    suffix: Option<String>,
    req: Request,
) -> HandlerResult {
    let (parts, _) = req.into_parts();
    let query = QueryParams::from_uri(&parts.uri);
    let admin = build_admin_context(&parts, &query, state.config());

    let resolved = match state.content_types() {
        Some(service) => match resolve_alias(service, &admin, &alias).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(alias = %alias, error = %err, "Alias resolution failed");
                None
            }
        },
        None => None,
    }
    .unwrap_or_else(|| alias.clone());

    let mut location = format!("{}/content/{}", state.base_path(), resolved);
    if let Some(suffix) = suffix.as_deref().map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
        location.push('/');
        location.push_str(suffix);
    }
    if let Some(raw) = parts.uri.query().filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(raw);
    }
    tracing::debug!(alias = %alias, location = %location, "Alias redirect");
    Ok(redirect(&location))
}
