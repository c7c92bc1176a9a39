//! Per-request admin context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity carrier extracted by the authentication layer.
///
/// The console never issues or verifies credentials itself; whatever sits in
/// front of it (session middleware, token verifier, trusted proxy headers)
/// places one of these in the request extensions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Actor {
    /// Stable actor identifier.
    #[serde(default)]
    pub actor_id: String,
    /// Token subject, used when no actor id is present.
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub org_id: String,
    /// Role name used by role-based authorizers.
    #[serde(default)]
    pub role: Option<String>,
    /// Free-form claims.
    #[serde(default)]
    pub claims: Map<String, Value>,
}

impl Actor {
    /// The effective user id: actor id, falling back to the subject.
    pub fn user_id(&self) -> &str {
        if self.actor_id.trim().is_empty() {
            self.subject.trim()
        } else {
            self.actor_id.trim()
        }
    }
}

/// Session metadata exposed by the session layer (if any).
#[derive(Debug, Clone, Default)]
pub struct SessionMetadata(pub Map<String, Value>);

impl SessionMetadata {
    /// Read a non-empty string entry.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Bundle of user, tenant, org, environment and locale for one request.
///
/// Built once per request and passed by reference to every repository call so
/// storage backends can scope their reads and writes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminContext {
    pub user_id: String,
    pub tenant_id: String,
    pub org_id: String,
    pub environment: String,
    pub locale: String,
    /// The actor the context was derived from.
    #[serde(skip)]
    pub actor: Option<Actor>,
}

impl AdminContext {
    /// Context for background or test use with only a locale set.
    pub fn with_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Default::default()
        }
    }

    pub fn environment(&self) -> Option<&str> {
        Some(self.environment.as_str()).filter(|e| !e.is_empty())
    }

    pub fn tenant(&self) -> Option<&str> {
        Some(self.tenant_id.as_str()).filter(|t| !t.is_empty())
    }

    pub fn role(&self) -> Option<&str> {
        self.actor.as_ref().and_then(|a| a.role.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_user_id_falls_back_to_subject() {
        let actor = Actor {
            subject: "sub-1".to_string(),
            ..Default::default()
        };
        assert_eq!(actor.user_id(), "sub-1");

        let actor = Actor {
            actor_id: "actor-9".to_string(),
            subject: "sub-1".to_string(),
            ..Default::default()
        };
        assert_eq!(actor.user_id(), "actor-9");
    }

    #[test]
    fn test_empty_environment_is_none() {
        let ctx = AdminContext::with_locale("en");
        assert_eq!(ctx.environment(), None);
        assert_eq!(ctx.tenant(), None);
    }
}
