//! Content routing and presentation configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settings for the content-entry surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Alias paths that redirect to `/content/<slug>`.
    #[serde(default = "default_aliases")]
    pub aliases: Vec<String>,

    /// Default cell renderers keyed by field name or field type.
    #[serde(default = "default_renderers")]
    pub default_renderers: HashMap<String, String>,

    /// Panels that land on the detail page (with `?created=1`) after create.
    #[serde(default = "default_detail_after_create")]
    pub detail_after_create: Vec<String>,

    /// Panels that land on the edit page with `?created=1` after create.
    #[serde(default = "default_edit_with_created_marker")]
    pub edit_with_created_marker: Vec<String>,

    /// Panel whose records provide block icons for `blocks_chips` columns.
    #[serde(default = "default_block_definitions_panel")]
    pub block_definitions_panel: String,

    /// Cookie carrying the selected environment.
    #[serde(default = "default_environment_cookie")]
    pub environment_cookie: String,

    /// Concrete admin paths keyed by route key (e.g. `users: /admin/users`).
    #[serde(default)]
    pub routes: HashMap<String, String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
            default_renderers: default_renderers(),
            detail_after_create: default_detail_after_create(),
            edit_with_created_marker: default_edit_with_created_marker(),
            block_definitions_panel: default_block_definitions_panel(),
            environment_cookie: default_environment_cookie(),
            routes: HashMap::new(),
        }
    }
}

impl ContentConfig {
    pub fn redirects_to_detail_after_create(&self, panel: &str) -> bool {
        self.detail_after_create.iter().any(|p| p == panel)
    }

    pub fn marks_edit_after_create(&self, panel: &str) -> bool {
        self.edit_with_created_marker.iter().any(|p| p == panel)
    }
}

/// Feature gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Content-type builder API (compatibility checks, status changes, versions).
    #[serde(default = "default_true")]
    pub content_type_builder: bool,

    /// Preview links on edit forms.
    #[serde(default = "default_true")]
    pub preview: bool,

    /// Translation-aware editing.
    #[serde(default = "default_true")]
    pub translations: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            content_type_builder: true,
            preview: true,
            translations: true,
        }
    }
}

impl FeaturesConfig {
    /// Whether the named feature is enabled. Unknown features are enabled.
    pub fn is_enabled(&self, feature: &str) -> bool {
        match feature {
            "content_type_builder" => self.content_type_builder,
            "preview" => self.preview,
            "translations" => self.translations,
            _ => true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_aliases() -> Vec<String> {
    vec!["pages".to_string(), "posts".to_string()]
}

fn default_renderers() -> HashMap<String, String> {
    HashMap::from([("blocks".to_string(), "blocks_chips".to_string())])
}

fn default_detail_after_create() -> Vec<String> {
    vec!["esign_documents".to_string()]
}

fn default_edit_with_created_marker() -> Vec<String> {
    vec!["esign_agreements".to_string()]
}

fn default_block_definitions_panel() -> String {
    "block_definitions".to_string()
}

fn default_environment_cookie() -> String {
    "admin_environment".to_string()
}
