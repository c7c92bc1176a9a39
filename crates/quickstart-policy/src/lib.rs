//! Access control for console operations.
//!
//! Two layers decide whether a CRUD verb is allowed on a panel:
//!
//! 1. An [`Authorizer`], asked with the panel's declared permission string
//!    (e.g. `posts.edit`) and the panel name.
//! 2. A [`FallbackPolicy`], asked with a resource (default `admin`) and the
//!    CRUD action when no authorizer is configured or the panel declares no
//!    permission for the verb.
//!
//! When neither layer has anything to say, access is allowed.

pub mod feature;
pub mod guard;

use async_trait::async_trait;
use quickstart_core::{AdminContext, AdminResult, Permissions, PolicyConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use feature::{FeatureGate, features};
pub use guard::PermissionGuard;

/// CRUD verb being guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudAction {
    Read,
    Create,
    Edit,
    Delete,
}

impl CrudAction {
    pub fn as_str(self) -> &'static str {
        match self {
            CrudAction::Read => "read",
            CrudAction::Create => "create",
            CrudAction::Edit => "edit",
            CrudAction::Delete => "delete",
        }
    }

    /// Permission string a panel declares for this verb (empty if undeclared).
    pub fn permission(self, permissions: &Permissions) -> &str {
        let raw = match self {
            CrudAction::Read => &permissions.view,
            CrudAction::Create => &permissions.create,
            CrudAction::Edit => &permissions.edit,
            CrudAction::Delete => &permissions.delete,
        };
        raw.trim()
    }
}

impl std::fmt::Display for CrudAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission-string authorizer.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn can(&self, ctx: &AdminContext, permission: &str, resource: &str) -> AdminResult<bool>;
}

/// Resource/action policy consulted when no permission string applies.
#[async_trait]
pub trait FallbackPolicy: Send + Sync {
    async fn check(&self, ctx: &AdminContext, resource: &str, action: CrudAction) -> AdminResult<bool>;
}

/// Authorizer that grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn can(&self, _ctx: &AdminContext, permission: &str, resource: &str) -> AdminResult<bool> {
        tracing::trace!(permission = %permission, resource = %resource, "Allow-all authorizer");
        Ok(true)
    }
}

#[async_trait]
impl FallbackPolicy for AllowAll {
    async fn check(&self, _ctx: &AdminContext, _resource: &str, _action: CrudAction) -> AdminResult<bool> {
        Ok(true)
    }
}

/// Grants permissions by actor role.
///
/// A grant matches a permission exactly, via `*`, or via a `prefix.*` pattern.
#[derive(Debug, Clone, Default)]
pub struct RoleAuthorizer {
    roles: HashMap<String, Vec<String>>,
}

impl RoleAuthorizer {
    pub fn new(roles: HashMap<String, Vec<String>>) -> Self {
        Self { roles }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.roles.clone())
    }

    fn grants(&self, role: &str, permission: &str) -> bool {
        self.roles.get(role).is_some_and(|granted| {
            granted.iter().any(|g| {
                let g = g.trim();
                g == "*"
                    || g == permission
                    || g
                        .strip_suffix(".*")
                        .is_some_and(|prefix| permission.starts_with(&format!("{}.", prefix)))
            })
        })
    }
}

#[async_trait]
impl Authorizer for RoleAuthorizer {
    async fn can(&self, ctx: &AdminContext, permission: &str, resource: &str) -> AdminResult<bool> {
        let Some(role) = ctx.role() else {
            tracing::debug!(permission = %permission, resource = %resource, "No role on request");
            return Ok(false);
        };
        Ok(self.grants(role, permission))
    }
}

/// Fallback policy from the configured `resource -> actions` table.
///
/// Undeclared resources are allowed.
#[derive(Debug, Clone, Default)]
pub struct StaticFallbackPolicy {
    resources: HashMap<String, Vec<String>>,
}

impl StaticFallbackPolicy {
    pub fn new(resources: HashMap<String, Vec<String>>) -> Self {
        Self { resources }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.resources.clone())
    }
}

#[async_trait]
impl FallbackPolicy for StaticFallbackPolicy {
    async fn check(&self, _ctx: &AdminContext, resource: &str, action: CrudAction) -> AdminResult<bool> {
        Ok(match self.resources.get(resource) {
            None => true,
            Some(actions) => actions
                .iter()
                .map(|a| a.trim())
                .any(|a| a == "*" || a.eq_ignore_ascii_case(action.as_str())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickstart_core::Actor;

    fn ctx_with_role(role: &str) -> AdminContext {
        AdminContext {
            actor: Some(Actor {
                role: Some(role.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_permission_for_action() {
        let permissions = Permissions {
            view: "posts.view".to_string(),
            edit: " posts.edit ".to_string(),
            ..Default::default()
        };
        assert_eq!(CrudAction::Read.permission(&permissions), "posts.view");
        assert_eq!(CrudAction::Edit.permission(&permissions), "posts.edit");
        assert_eq!(CrudAction::Delete.permission(&permissions), "");
    }

    #[tokio::test]
    async fn test_role_authorizer_patterns() {
        let authorizer = RoleAuthorizer::new(HashMap::from([
            ("editor".to_string(), vec!["posts.*".to_string(), "pages.view".to_string()]),
            ("admin".to_string(), vec!["*".to_string()]),
        ]));

        let editor = ctx_with_role("editor");
        assert!(authorizer.can(&editor, "posts.delete", "posts").await.unwrap());
        assert!(authorizer.can(&editor, "pages.view", "pages").await.unwrap());
        assert!(!authorizer.can(&editor, "pages.edit", "pages").await.unwrap());
        assert!(!authorizer.can(&editor, "postsx.view", "postsx").await.unwrap());

        assert!(authorizer.can(&ctx_with_role("admin"), "anything", "x").await.unwrap());
        assert!(!authorizer.can(&AdminContext::default(), "pages.view", "pages").await.unwrap());
    }

    #[tokio::test]
    async fn test_static_fallback_policy() {
        let policy = StaticFallbackPolicy::new(HashMap::from([(
            "admin".to_string(),
            vec!["read".to_string(), "edit".to_string()],
        )]));
        let ctx = AdminContext::default();

        assert!(policy.check(&ctx, "admin", CrudAction::Read).await.unwrap());
        assert!(!policy.check(&ctx, "admin", CrudAction::Delete).await.unwrap());
        assert!(policy.check(&ctx, "other", CrudAction::Delete).await.unwrap());
    }
}
