//! Build the per-request [`AdminContext`].
//!
//! Raw identity headers seed the context; an [`Actor`] placed in the request
//! extensions by the authentication layer overrides them. The environment is
//! taken from the query (`env`, then `environment`), then session metadata,
//! then the environment cookie.

use crate::query::QueryParams;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use quickstart_core::{Actor, AdminContext, QuickstartConfig, SessionMetadata};

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_TENANT_ID: &str = "x-tenant-id";
pub const HEADER_ORG_ID: &str = "x-org-id";
pub const HEADER_LOCALE: &str = "x-locale";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Value of cookie `name` from the `Cookie` header(s).
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(|value| {
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
        .filter(|v| !v.trim().is_empty())
}

/// Environment in precedence order: query, session metadata, cookie.
pub fn resolve_environment(
    query: &QueryParams,
    session: Option<&SessionMetadata>,
    headers: &HeaderMap,
    cookie_name: &str,
) -> Option<String> {
    if let Some(env) = query.environment() {
        return Some(env.to_string());
    }
    if let Some(env) = session.and_then(|s| s.get_str("environment").or_else(|| s.get_str("env"))) {
        return Some(env.to_string());
    }
    cookie_value(headers, cookie_name)
}

/// Resolve the admin context for a request.
pub fn build_admin_context(
    parts: &Parts,
    query: &QueryParams,
    config: &QuickstartConfig,
) -> AdminContext {
    let headers = &parts.headers;
    let mut ctx = AdminContext {
        user_id: header_str(headers, HEADER_USER_ID).unwrap_or_default().to_string(),
        tenant_id: header_str(headers, HEADER_TENANT_ID).unwrap_or_default().to_string(),
        org_id: header_str(headers, HEADER_ORG_ID).unwrap_or_default().to_string(),
        ..Default::default()
    };

    if let Some(actor) = parts.extensions.get::<Actor>() {
        let user = actor.user_id();
        if !user.is_empty() {
            ctx.user_id = user.to_string();
        }
        if !actor.tenant_id.trim().is_empty() {
            ctx.tenant_id = actor.tenant_id.trim().to_string();
        }
        if !actor.org_id.trim().is_empty() {
            ctx.org_id = actor.org_id.trim().to_string();
        }
        ctx.actor = Some(actor.clone());
    }

    let session = parts.extensions.get::<SessionMetadata>();
    if let Some(env) = resolve_environment(query, session, headers, &config.content.environment_cookie) {
        ctx.environment = env;
    }

    ctx.locale = query
        .requested_locale()
        .or_else(|| header_str(headers, HEADER_LOCALE))
        .unwrap_or(config.default_locale.as_str())
        .to_string();

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    fn parts_for(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_actor_overrides_headers() {
        let mut parts = parts_for(
            "/admin/content/pages",
            &[(HEADER_USER_ID, "raw-user"), (HEADER_TENANT_ID, "raw-tenant")],
        );
        parts.extensions.insert(Actor {
            subject: "subject-1".to_string(),
            tenant_id: "acme".to_string(),
            ..Default::default()
        });

        let ctx = build_admin_context(&parts, &QueryParams::default(), &QuickstartConfig::default());
        assert_eq!(ctx.user_id, "subject-1");
        assert_eq!(ctx.tenant_id, "acme");
        assert_eq!(ctx.locale, "en");
        assert!(ctx.environment().is_none());
    }

    #[test]
    fn test_environment_precedence() {
        let config = QuickstartConfig::default();
        let cookie = [("cookie", "theme=dark; admin_environment=cookie-env")];

        let parts = parts_for("/x", &cookie);
        let ctx = build_admin_context(&parts, &QueryParams::default(), &config);
        assert_eq!(ctx.environment, "cookie-env");

        let mut parts = parts_for("/x", &cookie);
        let mut meta = serde_json::Map::new();
        meta.insert("env".to_string(), json!("session-env"));
        parts.extensions.insert(SessionMetadata(meta));
        let ctx = build_admin_context(&parts, &QueryParams::default(), &config);
        assert_eq!(ctx.environment, "session-env");

        let query = QueryParams::parse("environment=query-env");
        let ctx = build_admin_context(&parts, &query, &config);
        assert_eq!(ctx.environment, "query-env");
    }

    #[test]
    fn test_locale_resolution() {
        let config = QuickstartConfig::default();
        let parts = parts_for("/x", &[(HEADER_LOCALE, "fr")]);

        let ctx = build_admin_context(&parts, &QueryParams::default(), &config);
        assert_eq!(ctx.locale, "fr");

        let ctx = build_admin_context(&parts, &QueryParams::parse("requested_locale=es"), &config);
        assert_eq!(ctx.locale, "es");
    }
}
