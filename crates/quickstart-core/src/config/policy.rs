//! Access policy configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static access policy.
///
/// `roles` grants permission strings to actor roles (consulted by the role
/// authorizer). `resources` lists allowed actions per resource (consulted by
/// the fallback policy when no authorizer is configured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Resource name used by the fallback policy.
    #[serde(default = "default_resource")]
    pub default_resource: String,

    /// Role name -> granted permissions. `*` grants everything.
    #[serde(default)]
    pub roles: HashMap<String, Vec<String>>,

    /// Resource -> allowed actions. `*` allows every action.
    #[serde(default)]
    pub resources: HashMap<String, Vec<String>>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_resource: default_resource(),
            roles: HashMap::new(),
            resources: HashMap::new(),
        }
    }
}

fn default_resource() -> String {
    "admin".to_string()
}
