//! Build the console from configuration.

use crate::assets;
use anyhow::Context;
use axum::Router;
use quickstart_console::routes::canonical_path;
use quickstart_console::{BuiltinViews, ConsoleServer, ConsoleState, panel_router};
use quickstart_core::{QuickstartConfig, split_panel_name};
use quickstart_panels::{InMemoryContentTypes, InMemoryRepository, Panel, PanelRegistry};
use std::sync::Arc;

/// Register every configured panel with an in-memory repository holding its seed.
pub fn build_registry(config: &QuickstartConfig) -> PanelRegistry {
    let registry = PanelRegistry::new();
    for definition in &config.panels {
        let (bare, suffix_env) = split_panel_name(&definition.name);
        let environment = definition
            .environment
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .or(suffix_env);

        let repository = InMemoryRepository::with_records(bare, definition.seed.clone());
        let mut panel = Panel::new(bare, definition.schema.clone(), Arc::new(repository));
        if let Some(env) = environment {
            panel = panel.with_environment(env);
        }
        if let Some(workflow) = &definition.workflow {
            panel = panel.with_workflow(workflow.clone());
        }
        let panel = registry.register(panel);
        tracing::debug!(
            panel = %panel.qualified_name(),
            seed = definition.seed.len(),
            "Registered panel"
        );
    }
    registry
}

/// Console state: panels, content types and views (from `templates_dir` when set).
pub fn build_state(config: QuickstartConfig) -> anyhow::Result<ConsoleState> {
    let registry = Arc::new(build_registry(&config));
    let content_types = InMemoryContentTypes::new(config.content_types.clone());
    tracing::info!(
        panels = registry.len(),
        content_types = content_types.len(),
        "Loaded console configuration"
    );

    let views = match &config.templates_dir {
        Some(dir) => BuiltinViews::from_dir(dir)
            .with_context(|| format!("failed to load templates from {}", dir.display()))?,
        None => BuiltinViews::new(),
    };

    Ok(ConsoleState::new(config, registry)
        .with_content_types(Arc::new(content_types))
        .with_builtin_views(Arc::new(views)))
}

/// Routes for custom-owned panels that have a configured path.
fn custom_panel_routes(state: &ConsoleState) -> Router {
    let mut router = Router::new();
    let mut mounted = Vec::new();
    for panel in state.panels().all() {
        if !panel.schema().is_custom_owned() || mounted.contains(&panel.name().to_string()) {
            continue;
        }
        let Some(path) = canonical_path(state.url_resolver(), panel.name()) else {
            tracing::debug!(panel = %panel.name(), "Custom-owned panel has no configured route");
            continue;
        };
        tracing::debug!(panel = %panel.name(), path = %path, "Mounting custom-owned panel");
        router = router.merge(panel_router(state.clone(), panel.name(), &path));
        mounted.push(panel.name().to_string());
    }
    router
}

/// Server with the console, custom panel routes, health check and static assets.
pub fn build_server(config: QuickstartConfig) -> anyhow::Result<ConsoleServer> {
    let state = build_state(config)?;
    let extra = custom_panel_routes(&state).merge(assets::router());
    Ok(ConsoleServer::new(state).with_routes(extra))
}
