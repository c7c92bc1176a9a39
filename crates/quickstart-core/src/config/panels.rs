//! Panel definitions declared in configuration.

use crate::panel::PanelSchema;
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// A panel declared in configuration and backed by an in-memory repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelDefinition {
    /// Logical name (`pages`, or `pages@staging`).
    pub name: String,
    /// Environment scope; overrides any `@env` suffix on the name.
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub schema: PanelSchema,
    /// Workflow binding name.
    #[serde(default)]
    pub workflow: Option<String>,
    /// Records loaded at startup.
    #[serde(default)]
    pub seed: Vec<Record>,
}
