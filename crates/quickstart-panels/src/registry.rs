//! Panel registry.
//!
//! Panels are keyed by `(name, environment)`. The textual form `name@env` is
//! accepted wherever a name is, and lookups with an environment try the scoped
//! panel before the bare one.

use crate::repository::Repository;
use quickstart_core::{
    AdminContext, AdminError, AdminResult, ListOptions, PanelSchema, Record, split_panel_name,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry key for a panel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PanelKey {
    pub name: String,
    pub environment: Option<String>,
}

impl PanelKey {
    pub fn new(name: impl Into<String>, environment: Option<&str>) -> Self {
        Self {
            name: name.into(),
            environment: environment
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        }
    }

    /// Parse `name` or `name@env`.
    pub fn parse(raw: &str) -> Self {
        let (name, env) = split_panel_name(raw);
        Self::new(name, env)
    }

    pub fn bare(&self) -> Self {
        Self::new(self.name.clone(), None)
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.environment {
            Some(env) => write!(f, "{}@{}", self.name, env),
            None => f.write_str(&self.name),
        }
    }
}

/// A typed repository view with a declarative schema.
pub struct Panel {
    key: PanelKey,
    schema: PanelSchema,
    repository: Arc<dyn Repository>,
    workflow: Option<String>,
}

impl Panel {
    /// Create a panel. `name` may carry an `@env` suffix.
    pub fn new(name: &str, schema: PanelSchema, repository: Arc<dyn Repository>) -> Self {
        Self {
            key: PanelKey::parse(name),
            schema,
            repository,
            workflow: None,
        }
    }

    pub fn with_environment(mut self, environment: &str) -> Self {
        self.key = PanelKey::new(self.key.name.clone(), Some(environment));
        self
    }

    pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
        self.workflow = Some(workflow.into()).filter(|w: &String| !w.is_empty());
        self
    }

    pub fn key(&self) -> &PanelKey {
        &self.key
    }

    /// Canonical (bare) name.
    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn environment(&self) -> Option<&str> {
        self.key.environment.as_deref()
    }

    /// `name@env`, or the bare name for unscoped panels.
    pub fn qualified_name(&self) -> String {
        self.key.to_string()
    }

    pub fn schema(&self) -> &PanelSchema {
        &self.schema
    }

    pub fn workflow(&self) -> Option<&str> {
        self.workflow.as_deref()
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    pub async fn list(
        &self,
        ctx: &AdminContext,
        opts: &ListOptions,
    ) -> AdminResult<(Vec<Record>, u64)> {
        self.repository.list(ctx, opts).await
    }

    pub async fn get(&self, ctx: &AdminContext, id: &str) -> AdminResult<Record> {
        self.repository.get(ctx, id).await
    }

    pub async fn create(&self, ctx: &AdminContext, record: Record) -> AdminResult<Record> {
        self.repository.create(ctx, record).await
    }

    pub async fn update(&self, ctx: &AdminContext, id: &str, record: Record) -> AdminResult<Record> {
        self.repository.update(ctx, id, record).await
    }

    pub async fn delete(&self, ctx: &AdminContext, id: &str) -> AdminResult<()> {
        self.repository.delete(ctx, id).await
    }
}

impl fmt::Debug for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("key", &self.key)
            .field("workflow", &self.workflow)
            .finish_non_exhaustive()
    }
}

/// Register-once, read-many panel registry.
#[derive(Default)]
pub struct PanelRegistry {
    panels: RwLock<BTreeMap<PanelKey, Arc<Panel>>>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a panel, replacing any panel with the same key.
    pub fn register(&self, panel: Panel) -> Arc<Panel> {
        let panel = Arc::new(panel);
        let key = panel.key().clone();
        let previous = self
            .panels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), panel.clone());
        if previous.is_some() {
            tracing::warn!(panel = %key, "Panel re-registered, previous instance replaced");
        } else {
            tracing::debug!(panel = %key, "Panel registered");
        }
        panel
    }

    pub fn get_key(&self, key: &PanelKey) -> Option<Arc<Panel>> {
        self.panels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Look up `name` (or `name@env`) in `environment`.
    ///
    /// An `@env` suffix on the name wins over `environment`. The scoped key is
    /// tried first, then the bare key.
    pub fn get(&self, name: &str, environment: Option<&str>) -> Option<Arc<Panel>> {
        let parsed = PanelKey::parse(name);
        if parsed.name.is_empty() {
            return None;
        }
        let env = parsed
            .environment
            .clone()
            .or_else(|| environment.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string));

        if let Some(env) = env
            && let Some(panel) = self.get_key(&PanelKey::new(parsed.name.clone(), Some(&env)))
        {
            return Some(panel);
        }
        self.get_key(&parsed.bare())
    }

    /// Like [`get`](Self::get), but a miss is `PANEL_NOT_FOUND`.
    pub fn resolve(&self, name: &str, environment: Option<&str>) -> AdminResult<Arc<Panel>> {
        self.get(name, environment)
            .ok_or_else(|| AdminError::panel_not_found(name))
    }

    pub fn contains(&self, name: &str, environment: Option<&str>) -> bool {
        self.get(name, environment).is_some()
    }

    /// Every panel, ordered by name then environment.
    pub fn all(&self) -> Vec<Arc<Panel>> {
        self.panels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.panels.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
