//! Schema version history.
//!
//! Each content type keeps an append-only list of schema versions. A
//! compatibility check stages a *pending* version; activating the content type
//! promotes it into the list.

use crate::diff::{SchemaChange, compare_schemas};
use chrono::{DateTime, Utc};
use quickstart_core::{ContentType, ContentTypeStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One recorded schema revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Numeric version rendered as a string. Empty until the version is added.
    #[serde(default)]
    pub version: String,
    pub schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_schema: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_breaking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub changes: Vec<SchemaChange>,
}

impl SchemaVersion {
    pub fn new(schema: Value) -> Self {
        Self {
            version: String::new(),
            schema,
            ui_schema: None,
            created_at: Utc::now(),
            created_by: None,
            is_breaking: false,
            migration_status: None,
            migrated_count: None,
            total_count: None,
            changes: Vec::new(),
        }
    }

    /// Version built from a persisted content type when nothing is pending.
    pub fn from_content_type(ct: &ContentType) -> Self {
        let mut version = Self::new(ct.schema.clone());
        version.ui_schema = ct.ui_schema.clone();
        version.created_by = ct.updated_by.clone();
        if let Some(v) = &ct.schema_version {
            version.version = v.clone();
        }
        version
    }
}

/// Storage for per-content-type version history.
///
/// Each operation is atomic with respect to the others.
pub trait VersionStore: Send + Sync {
    /// Stage `entry` as the pending version for `key`, replacing any earlier one.
    fn set_pending(&self, key: &str, entry: SchemaVersion);

    /// Remove and return the pending version for `key`.
    fn flush_pending(&self, key: &str) -> Option<SchemaVersion>;

    /// Append `entry`, assigning the next version number. Returns the stored entry.
    fn add_version(&self, key: &str, entry: SchemaVersion) -> SchemaVersion;

    /// Versions for `key`, newest first.
    fn list_versions(&self, key: &str) -> Vec<SchemaVersion>;
}

#[derive(Default)]
struct VersionState {
    pending: HashMap<String, SchemaVersion>,
    versions: HashMap<String, Vec<SchemaVersion>>,
    counters: HashMap<String, u64>,
}

/// Process-local version store.
#[derive(Default)]
pub struct InMemoryVersionStore {
    state: Mutex<VersionState>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut VersionState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl VersionStore for InMemoryVersionStore {
    fn set_pending(&self, key: &str, entry: SchemaVersion) {
        self.with_state(|state| {
            state.pending.insert(key.to_string(), entry);
        })
    }

    fn flush_pending(&self, key: &str) -> Option<SchemaVersion> {
        self.with_state(|state| state.pending.remove(key))
    }

    fn add_version(&self, key: &str, mut entry: SchemaVersion) -> SchemaVersion {
        self.with_state(|state| {
            let counter = state.counters.entry(key.to_string()).or_insert(0);
            *counter += 1;
            if let Ok(supplied) = entry.version.trim().parse::<u64>()
                && supplied > *counter
            {
                *counter = supplied;
            }
            entry.version = counter.to_string();

            state
                .versions
                .entry(key.to_string())
                .or_default()
                .push(entry.clone());
            entry
        })
    }

    fn list_versions(&self, key: &str) -> Vec<SchemaVersion> {
        self.with_state(|state| {
            state
                .versions
                .get(key)
                .map(|list| list.iter().rev().cloned().collect())
                .unwrap_or_default()
        })
    }
}

/// Stable key for a content type: `content_type_id`, then `id`, then `slug`.
pub fn content_type_key<'a>(
    content_type_id: Option<&'a str>,
    id: Option<&'a str>,
    slug: Option<&'a str>,
) -> Option<&'a str> {
    [content_type_id, id, slug]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Compatibility checks and activation on top of a [`VersionStore`].
#[derive(Clone)]
pub struct SchemaLifecycle {
    store: Arc<dyn VersionStore>,
}

impl SchemaLifecycle {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn VersionStore> {
        &self.store
    }

    /// Compare `current` against `proposed` and stage the proposal as pending.
    pub fn check_compatibility(
        &self,
        key: &str,
        current: &Value,
        proposed: Value,
        ui_schema: Option<Value>,
        actor: Option<&str>,
    ) -> crate::CompatibilityReport {
        let report = compare_schemas(current, &proposed);

        let mut pending = SchemaVersion::new(proposed);
        pending.ui_schema = ui_schema;
        pending.created_by = actor.map(str::to_string).filter(|a| !a.is_empty());
        pending.is_breaking = report.is_breaking();
        pending.changes = report.changes();
        self.store.set_pending(key, pending);

        tracing::debug!(
            key = %key,
            breaking = report.breaking_changes.len(),
            warnings = report.warnings.len(),
            "Staged pending schema version"
        );
        report
    }

    /// Record a status transition. Moving to `active` promotes the pending
    /// version, or a version built from the content type itself.
    pub fn on_status_change(
        &self,
        key: &str,
        content_type: &ContentType,
        status: ContentTypeStatus,
    ) -> Option<SchemaVersion> {
        if status != ContentTypeStatus::Active {
            return None;
        }
        let entry = self
            .store
            .flush_pending(key)
            .unwrap_or_else(|| SchemaVersion::from_content_type(content_type));
        let stored = self.store.add_version(key, entry);
        tracing::info!(key = %key, version = %stored.version, "Schema version recorded");
        Some(stored)
    }

    pub fn list_versions(&self, key: &str) -> Vec<SchemaVersion> {
        self.store.list_versions(key)
    }
}

impl Default for SchemaLifecycle {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryVersionStore::new()))
    }
}
