//! Permission guard applied before every CRUD operation.

use crate::{Authorizer, CrudAction, FallbackPolicy};
use quickstart_core::{AdminContext, AdminError, AdminResult, Permissions};
use std::sync::Arc;

/// Default resource name handed to the fallback policy.
pub const DEFAULT_RESOURCE: &str = "admin";

/// Combines an optional [`Authorizer`] and an optional [`FallbackPolicy`].
#[derive(Clone)]
pub struct PermissionGuard {
    authorizer: Option<Arc<dyn Authorizer>>,
    fallback: Option<Arc<dyn FallbackPolicy>>,
    resource: String,
}

impl Default for PermissionGuard {
    fn default() -> Self {
        Self {
            authorizer: None,
            fallback: None,
            resource: DEFAULT_RESOURCE.to_string(),
        }
    }
}

impl PermissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackPolicy>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Resource used for fallback checks. Blank keeps `admin`.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        if !resource.trim().is_empty() {
            self.resource = resource.trim().to_string();
        }
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Check `action` on `panel`, returning `Forbidden` on denial.
    pub async fn require(
        &self,
        ctx: &AdminContext,
        panel: &str,
        permissions: &Permissions,
        action: CrudAction,
    ) -> AdminResult<()> {
        let permission = action.permission(permissions);

        if let Some(authorizer) = &self.authorizer
            && !permission.is_empty()
        {
            if authorizer.can(ctx, permission, panel).await? {
                return Ok(());
            }
            tracing::info!(
                panel = %panel,
                permission = %permission,
                user = %ctx.user_id,
                "Permission denied"
            );
            return Err(AdminError::permission_denied(permission, panel));
        }

        if let Some(fallback) = &self.fallback {
            if fallback.check(ctx, &self.resource, action).await? {
                return Ok(());
            }
            tracing::info!(
                panel = %panel,
                resource = %self.resource,
                action = %action,
                user = %ctx.user_id,
                "Action denied by fallback policy"
            );
            return Err(AdminError::permission_denied(action.as_str(), &self.resource)
                .with_metadata("panel", panel));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AllowAll, RoleAuthorizer, StaticFallbackPolicy};
    use quickstart_core::ErrorKind;
    use std::collections::HashMap;

    fn perms() -> Permissions {
        Permissions {
            view: "posts.view".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_nothing_configured_allows() {
        let guard = PermissionGuard::new();
        guard
            .require(&AdminContext::default(), "posts", &perms(), CrudAction::Delete)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_authorizer_denial_is_forbidden() {
        let guard = PermissionGuard::new()
            .with_authorizer(Arc::new(RoleAuthorizer::new(HashMap::new())));
        let err = guard
            .require(&AdminContext::default(), "posts", &perms(), CrudAction::Read)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert_eq!(err.metadata["permission"], "posts.view");

        // No permission declared for delete and no fallback: allowed.
        guard
            .require(&AdminContext::default(), "posts", &perms(), CrudAction::Delete)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fallback_uses_default_resource() {
        let fallback = StaticFallbackPolicy::new(HashMap::from([(
            "admin".to_string(),
            vec!["read".to_string()],
        )]));
        let guard = PermissionGuard::new().with_fallback(Arc::new(fallback));
        let ctx = AdminContext::default();

        guard.require(&ctx, "posts", &perms(), CrudAction::Read).await.unwrap();
        let err = guard
            .require(&ctx, "posts", &perms(), CrudAction::Edit)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.metadata["resource"], "admin");
    }

    #[tokio::test]
    async fn test_allow_all_authorizer() {
        let guard = PermissionGuard::new()
            .with_authorizer(Arc::new(AllowAll))
            .with_resource(" ");
        assert_eq!(guard.resource(), "admin");
        guard
            .require(&AdminContext::default(), "posts", &perms(), CrudAction::Read)
            .await
            .unwrap();
    }
}
