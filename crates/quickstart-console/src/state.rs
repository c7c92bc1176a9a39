//! Shared console state.

use crate::form::{FormRenderer, HtmlFormRenderer};
use crate::preview::{PreviewService, TokenPreviewService};
use crate::routes::{StaticUrlResolver, UrlResolver};
use crate::templates::{TemplateChecker, ViewEngine};
use crate::views::BuiltinViews;
use quickstart_core::{PolicyConfig, QuickstartConfig};
use quickstart_panels::{ContentTypeService, PanelRegistry};
use quickstart_policy::{
    FeatureGate, PermissionGuard, RoleAuthorizer, StaticFallbackPolicy, features,
};
use quickstart_schema::SchemaLifecycle;
use std::sync::Arc;

/// Shared state handed to every console handler.
#[derive(Clone)]
pub struct ConsoleState {
    inner: Arc<Inner>,
}

#[derive(Clone)]
struct Inner {
    config: Arc<QuickstartConfig>,
    base_path: String,
    panels: Arc<PanelRegistry>,
    content_types: Option<Arc<dyn ContentTypeService>>,
    guard: PermissionGuard,
    features: FeatureGate,
    views: Arc<dyn ViewEngine>,
    template_checker: Option<Arc<dyn TemplateChecker>>,
    form_renderer: Arc<dyn FormRenderer>,
    preview: Option<Arc<dyn PreviewService>>,
    lifecycle: SchemaLifecycle,
    url_resolver: Arc<dyn UrlResolver>,
}

impl ConsoleState {
    /// State with defaults derived from `config`: policy from the `policy`
    /// section, built-in views (also used as the template checker), token
    /// previews and an in-memory schema version store.
    pub fn new(config: QuickstartConfig, panels: Arc<PanelRegistry>) -> Self {
        let views = Arc::new(BuiltinViews::new());
        let url_resolver = Arc::new(StaticUrlResolver::new(config.content.routes.clone()));

        Self {
            inner: Arc::new(Inner {
                base_path: config.normalized_base_path(),
                guard: guard_from_policy(&config.policy),
                features: FeatureGate::new(config.features.clone()),
                config: Arc::new(config),
                panels,
                content_types: None,
                views: views.clone(),
                template_checker: Some(views),
                form_renderer: Arc::new(HtmlFormRenderer),
                preview: Some(Arc::new(TokenPreviewService::default())),
                lifecycle: SchemaLifecycle::default(),
                url_resolver,
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut Inner {
        Arc::make_mut(&mut self.inner)
    }

    pub fn with_content_types(mut self, service: Arc<dyn ContentTypeService>) -> Self {
        self.inner_mut().content_types = Some(service);
        self
    }

    pub fn with_guard(mut self, guard: PermissionGuard) -> Self {
        self.inner_mut().guard = guard;
        self
    }

    /// Replace the view engine. The checker is cleared; set one with
    /// [`with_template_checker`](Self::with_template_checker) if the engine has one.
    pub fn with_views(mut self, views: Arc<dyn ViewEngine>) -> Self {
        let inner = self.inner_mut();
        inner.views = views;
        inner.template_checker = None;
        self
    }

    pub fn with_template_checker(mut self, checker: Arc<dyn TemplateChecker>) -> Self {
        self.inner_mut().template_checker = Some(checker);
        self
    }

    /// Use `views` as both engine and checker.
    pub fn with_builtin_views(mut self, views: Arc<BuiltinViews>) -> Self {
        let inner = self.inner_mut();
        inner.views = views.clone();
        inner.template_checker = Some(views);
        self
    }

    pub fn with_form_renderer(mut self, renderer: Arc<dyn FormRenderer>) -> Self {
        self.inner_mut().form_renderer = renderer;
        self
    }

    pub fn with_preview(mut self, preview: Option<Arc<dyn PreviewService>>) -> Self {
        self.inner_mut().preview = preview;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: SchemaLifecycle) -> Self {
        self.inner_mut().lifecycle = lifecycle;
        self
    }

    pub fn with_url_resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
        self.inner_mut().url_resolver = resolver;
        self
    }

    pub fn config(&self) -> &QuickstartConfig {
        &self.inner.config
    }

    /// Base path without a trailing slash (`/admin`).
    pub fn base_path(&self) -> &str {
        &self.inner.base_path
    }

    pub fn panels(&self) -> &PanelRegistry {
        &self.inner.panels
    }

    pub fn content_types(&self) -> Option<&dyn ContentTypeService> {
        self.inner.content_types.as_deref()
    }

    pub fn guard(&self) -> &PermissionGuard {
        &self.inner.guard
    }

    pub fn features(&self) -> &FeatureGate {
        &self.inner.features
    }

    pub fn views(&self) -> &dyn ViewEngine {
        self.inner.views.as_ref()
    }

    pub fn template_checker(&self) -> Option<&dyn TemplateChecker> {
        self.inner.template_checker.as_deref()
    }

    pub fn form_renderer(&self) -> &dyn FormRenderer {
        self.inner.form_renderer.as_ref()
    }

    /// The preview service, if one is configured and the feature is on.
    pub fn preview(&self) -> Option<&dyn PreviewService> {
        if !self.inner.features.is_enabled(features::PREVIEW) {
            return None;
        }
        self.inner.preview.as_deref()
    }

    pub fn lifecycle(&self) -> &SchemaLifecycle {
        &self.inner.lifecycle
    }

    pub fn url_resolver(&self) -> &dyn UrlResolver {
        self.inner.url_resolver.as_ref()
    }
}

/// Role authorizer when roles are declared, static fallback when resources are.
fn guard_from_policy(policy: &PolicyConfig) -> PermissionGuard {
    let mut guard = PermissionGuard::new().with_resource(policy.default_resource.clone());
    if !policy.roles.is_empty() {
        guard = guard.with_authorizer(Arc::new(RoleAuthorizer::from_config(policy)));
    }
    if !policy.resources.is_empty() {
        guard = guard.with_fallback(Arc::new(StaticFallbackPolicy::from_config(policy)));
    }
    guard
}
