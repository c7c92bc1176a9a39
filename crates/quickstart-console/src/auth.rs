//! Trusted-header actor extraction.
//!
//! Credential verification lives in front of the console (session layer,
//! token verifier or authenticating proxy). This middleware turns the identity
//! headers such a layer forwards into an [`Actor`] request extension.

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use quickstart_core::Actor;

pub const HEADER_ACTOR_ID: &str = "x-actor-id";
pub const HEADER_ACTOR_SUBJECT: &str = "x-actor-subject";
pub const HEADER_ACTOR_ROLE: &str = "x-actor-role";

fn header_string(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Actor carried by the request headers, if any identity header is set.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let actor = Actor {
        actor_id: header_string(headers, HEADER_ACTOR_ID),
        subject: header_string(headers, HEADER_ACTOR_SUBJECT),
        tenant_id: header_string(headers, crate::request_context::HEADER_TENANT_ID),
        org_id: header_string(headers, crate::request_context::HEADER_ORG_ID),
        role: Some(header_string(headers, HEADER_ACTOR_ROLE)).filter(|r| !r.is_empty()),
        claims: Default::default(),
    };
    if actor.user_id().is_empty() && actor.role.is_none() {
        return None;
    }
    Some(actor)
}

/// Insert an [`Actor`] extension unless an upstream layer already did.
pub async fn actor_middleware(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<Actor>().is_none()
        && let Some(actor) = actor_from_headers(request.headers())
    {
        tracing::trace!(actor = %actor.user_id(), role = ?actor.role, "Actor extracted from headers");
        request.extensions_mut().insert(actor);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(actor_from_headers(&headers).is_none());

        headers.insert(HEADER_ACTOR_SUBJECT, HeaderValue::from_static("sub-1"));
        headers.insert(HEADER_ACTOR_ROLE, HeaderValue::from_static("editor"));
        headers.insert("x-tenant-id", HeaderValue::from_static("acme"));

        let actor = actor_from_headers(&headers).unwrap();
        assert_eq!(actor.user_id(), "sub-1");
        assert_eq!(actor.role.as_deref(), Some("editor"));
        assert_eq!(actor.tenant_id, "acme");
    }
}
