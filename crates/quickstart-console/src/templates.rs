//! Template selection with per-panel overrides.
//!
//! Every console page has a generic template (`resources/content/list`, ...).
//! A panel can override it with `resources/<panel-slug>/<op>`. When a
//! [`TemplateChecker`] is available the choice is made up front; otherwise the
//! panel template is attempted and a "does not exist" error falls back to the
//! generic one.

use quickstart_core::AdminError;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by a [`ViewEngine`].
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("template {0} does not exist")]
    NotFound(String),

    #[error("failed to render template {name}: {message}")]
    Render { name: String, message: String },

    #[error("failed to load templates: {0}")]
    Load(String),
}

impl From<ViewError> for AdminError {
    fn from(err: ViewError) -> Self {
        let name = match &err {
            ViewError::NotFound(name) => name.clone(),
            ViewError::Render { name, .. } => name.clone(),
            ViewError::Load(_) => return AdminError::internal(err.to_string()),
        };
        AdminError::internal(err.to_string()).with_metadata("template", name)
    }
}

/// Renders a named template against a JSON view context.
pub trait ViewEngine: Send + Sync {
    fn render(&self, name: &str, context: &Value) -> Result<String, ViewError>;
}

/// Answers whether a template name can be rendered.
pub trait TemplateChecker: Send + Sync {
    fn exists(&self, name: &str) -> bool;
}

/// `pages@staging` -> `pages`, `blog_posts` -> `blog-posts`, `a.b` -> `a-b`.
pub fn normalize_slug(slug: &str) -> String {
    quickstart_core::canonical_panel_name(slug)
        .replace(['_', '.'], "-")
        .trim_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string()
}

/// The panel-specific template for `fallback`, e.g.
/// `("blog_posts", "resources/content/list")` -> `resources/blog-posts/list`.
pub fn candidate_template(slug: &str, fallback: &str) -> Option<String> {
    let slug = normalize_slug(slug);
    if slug.is_empty() {
        return None;
    }
    let base = fallback.rsplit('/').next().unwrap_or(fallback);
    Some(format!("resources/{}/{}", slug, base))
}

/// Whether an engine error means "no such template".
pub fn is_missing_template_error(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("does not exist")
        && ["template", "view", "layout"]
            .iter()
            .any(|word| message.contains(word))
}

/// Render the panel template if there is one, else `fallback`.
pub fn render_with_fallback(
    engine: &dyn ViewEngine,
    checker: Option<&dyn TemplateChecker>,
    slug: &str,
    fallback: &str,
    context: &Value,
) -> Result<String, ViewError> {
    let Some(candidate) = candidate_template(slug, fallback).filter(|c| c != fallback) else {
        return engine.render(fallback, context);
    };

    if let Some(checker) = checker {
        let name = if checker.exists(&candidate) {
            candidate.as_str()
        } else {
            fallback
        };
        tracing::debug!(template = %name, "Rendering template");
        return engine.render(name, context);
    }

    match engine.render(&candidate, context) {
        Err(err) if is_missing_template_error(&err.to_string()) => {
            tracing::debug!(template = %candidate, fallback = %fallback, "Falling back to generic template");
            engine.render(fallback, context)
        }
        other => other,
    }
}
