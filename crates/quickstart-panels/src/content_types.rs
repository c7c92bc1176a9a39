//! Content type service and lookups.

use async_trait::async_trait;
use quickstart_core::{AdminContext, AdminError, AdminResult, ContentType};
use std::sync::{PoisonError, RwLock};

/// Source of content type documents.
#[async_trait]
pub trait ContentTypeService: Send + Sync {
    /// All content types visible to the request.
    async fn content_types(&self, ctx: &AdminContext) -> AdminResult<Vec<ContentType>>;

    /// Content type with the given slug, if any.
    async fn content_type_by_slug(
        &self,
        ctx: &AdminContext,
        slug: &str,
    ) -> AdminResult<Option<ContentType>>;

    /// Insert or replace a content type (matched by slug and environment).
    async fn save_content_type(
        &self,
        ctx: &AdminContext,
        content_type: ContentType,
    ) -> AdminResult<ContentType>;
}

/// Content types held in memory, typically loaded from configuration.
#[derive(Default)]
pub struct InMemoryContentTypes {
    types: RwLock<Vec<ContentType>>,
}

impl InMemoryContentTypes {
    pub fn new(types: Vec<ContentType>) -> Self {
        let types = types.into_iter().map(with_id).collect();
        Self {
            types: RwLock::new(types),
        }
    }

    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn with_id(mut ct: ContentType) -> ContentType {
    if ct.id.trim().is_empty() {
        ct.id = match ct.environment.as_deref().filter(|e| !e.is_empty()) {
            Some(env) => format!("{}@{}", ct.slug, env),
            None => ct.slug.clone(),
        };
    }
    ct
}

fn same_environment(a: Option<&str>, b: Option<&str>) -> bool {
    let a = a.map(str::trim).filter(|s| !s.is_empty());
    let b = b.map(str::trim).filter(|s| !s.is_empty());
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

#[async_trait]
impl ContentTypeService for InMemoryContentTypes {
    async fn content_types(&self, _ctx: &AdminContext) -> AdminResult<Vec<ContentType>> {
        Ok(self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn content_type_by_slug(
        &self,
        ctx: &AdminContext,
        slug: &str,
    ) -> AdminResult<Option<ContentType>> {
        let slug = slug.trim();
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        let mut candidates = types.iter().filter(|ct| ct.slug == slug);

        // Prefer the variant scoped to the request environment, then a shared one.
        let found = match ctx.environment() {
            Some(env) => {
                let all: Vec<&ContentType> = candidates.collect();
                all.iter()
                    .find(|ct| same_environment(ct.environment.as_deref(), Some(env)))
                    .or_else(|| all.iter().find(|ct| ct.matches_environment(env)))
                    .or_else(|| all.first())
                    .map(|ct| (*ct).clone())
            }
            None => candidates.next().cloned(),
        };
        Ok(found)
    }

    async fn save_content_type(
        &self,
        _ctx: &AdminContext,
        content_type: ContentType,
    ) -> AdminResult<ContentType> {
        if content_type.slug.trim().is_empty() {
            return Err(AdminError::slug_required());
        }
        let content_type = with_id(content_type);
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        match types.iter_mut().find(|ct| {
            ct.slug == content_type.slug
                && same_environment(ct.environment.as_deref(), content_type.environment.as_deref())
        }) {
            Some(existing) => *existing = content_type.clone(),
            None => types.push(content_type.clone()),
        }
        Ok(content_type)
    }
}

/// Resolve a content type by slug or panel slug.
///
/// With an environment in the context, the environment-filtered list is
/// searched first; the unrestricted slug lookup is the fallback.
pub async fn resolve_content_type(
    service: &dyn ContentTypeService,
    ctx: &AdminContext,
    slug: &str,
) -> AdminResult<Option<ContentType>> {
    let slug = quickstart_core::canonical_panel_name(slug);
    if slug.is_empty() {
        return Ok(None);
    }

    let all = service.content_types(ctx).await?;

    if let Some(env) = ctx.environment() {
        let scoped: Vec<&ContentType> = all.iter().filter(|ct| ct.matches_environment(env)).collect();
        if let Some(ct) = find_by_slug_or_panel(&scoped, slug) {
            return Ok(Some(ct.clone()));
        }
    }

    if let Some(ct) = service.content_type_by_slug(ctx, slug).await? {
        return Ok(Some(ct));
    }

    let everything: Vec<&ContentType> = all.iter().collect();
    Ok(find_by_slug_or_panel(&everything, slug).cloned())
}

fn find_by_slug_or_panel<'a>(types: &[&'a ContentType], slug: &str) -> Option<&'a ContentType> {
    types
        .iter()
        .find(|ct| ct.slug == slug)
        .or_else(|| types.iter().find(|ct| ct.panel_slug() == slug))
        .copied()
}

/// Resolve an alias (e.g. `pages`) to the panel slug its content type presents
/// under: the `panel_slug` capability, then the slug.
pub async fn resolve_alias(
    service: &dyn ContentTypeService,
    ctx: &AdminContext,
    alias: &str,
) -> AdminResult<Option<String>> {
    Ok(resolve_content_type(service, ctx, alias)
        .await?
        .map(|ct| ct.panel_slug().to_string()))
}

/// Active content types visible in the request environment, sorted by label.
pub async fn active_content_types(
    service: &dyn ContentTypeService,
    ctx: &AdminContext,
) -> AdminResult<Vec<ContentType>> {
    let mut types: Vec<ContentType> = service
        .content_types(ctx)
        .await?
        .into_iter()
        .filter(|ct| ct.is_active())
        .filter(|ct| ctx.environment().is_none_or(|env| ct.matches_environment(env)))
        .collect();
    types.sort_by(|a, b| a.label().to_lowercase().cmp(&b.label().to_lowercase()));
    Ok(types)
}
