//! # quickstart-core
//!
//! Shared types for the admin console quickstart: content types, panel
//! schemas, records, the per-request [`AdminContext`], the error taxonomy and
//! configuration. Nothing in this crate depends on an HTTP framework.

pub mod config;
pub mod content_type;
pub mod context;
pub mod error;
pub mod panel;
pub mod record;

pub use config::{
    ConfigError, ContentConfig, FeaturesConfig, LogFormat, ObservabilityConfig, PanelDefinition,
    PolicyConfig, QuickstartConfig, ServerConfig,
};
pub use content_type::{ContentType, ContentTypeStatus};
pub use context::{Actor, AdminContext, SessionMetadata};
pub use error::{AdminError, AdminResult, ErrorKind, text_codes};
pub use panel::{
    Action, EntryMode, Field, FieldOption, Filter, PanelSchema, Permissions, RelationSpec,
    UiRouteMode,
};
pub use record::{FilterPredicate, ListOptions, Record};

/// Strip an `@environment` suffix from a panel name.
pub fn canonical_panel_name(name: &str) -> &str {
    match name.split_once('@') {
        Some((bare, _)) => bare.trim(),
        None => name.trim(),
    }
}

/// Split `name@env` into its parts.
pub fn split_panel_name(name: &str) -> (&str, Option<&str>) {
    match name.split_once('@') {
        Some((bare, env)) => {
            let env = env.trim();
            (bare.trim(), Some(env).filter(|e| !e.is_empty()))
        }
        None => (name.trim(), None),
    }
}

/// Title-case a field name: `created_at` -> `Created At`.
pub fn title_case(name: &str) -> String {
    name.split(['_', '-', ' ', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
