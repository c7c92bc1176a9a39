//! Error taxonomy shared by every layer of the console.
//!
//! Errors carry a [`ErrorKind`] (which maps onto an HTTP status), an optional
//! stable machine-readable text code, a human-readable message and free-form
//! metadata. HTTP crates turn these into responses; nothing here depends on a
//! web framework.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Stable text codes surfaced to API clients.
pub mod text_codes {
    pub const INVALID_FORM: &str = "INVALID_FORM";
    pub const INVALID_JSON: &str = "INVALID_JSON";
    pub const TRANSLATION_FALLBACK_EDIT_BLOCKED: &str = "TRANSLATION_FALLBACK_EDIT_BLOCKED";
    pub const FEATURE_DISABLED: &str = "FEATURE_DISABLED";
    pub const ID_REQUIRED: &str = "ID_REQUIRED";
    pub const SLUG_REQUIRED: &str = "SLUG_REQUIRED";
    pub const SCHEMA_REQUIRED: &str = "SCHEMA_REQUIRED";
    pub const TYPE_REQUIRED: &str = "TYPE_REQUIRED";
    pub const PANEL_NOT_FOUND: &str = "PANEL_NOT_FOUND";
    pub const CONTENT_SERVICE_UNAVAILABLE: &str = "CONTENT_SERVICE_UNAVAILABLE";
}

/// Broad class of an [`AdminError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing entity or unknown panel/slug.
    NotFound,
    /// Permission or feature-gate denial.
    Forbidden,
    /// Malformed payload or missing identifier.
    Validation,
    /// Request conflicts with the current state of the record.
    Conflict,
    /// Misconfiguration or an unavailable collaborator.
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::Validation => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }

    /// The category name used in structured error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by repositories, services and handlers.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AdminError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// Stable machine-readable identifier, if any.
    pub text_code: Option<&'static str>,
    /// Human-readable error message.
    pub message: String,
    /// Additional structured context.
    pub metadata: Map<String, Value>,
}

impl AdminError {
    /// Create a new error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            text_code: None,
            message: message.into(),
            metadata: Map::new(),
        }
    }

    /// Attach a text code.
    pub fn with_text_code(mut self, code: &'static str) -> Self {
        self.text_code = Some(code);
        self
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message).with_text_code(code)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message).with_text_code(code)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    // =========================================================================
    // Well-known errors
    // =========================================================================

    /// Unknown panel name.
    pub fn panel_not_found(name: &str) -> Self {
        Self::not_found(format!("panel '{}' not found", name))
            .with_text_code(text_codes::PANEL_NOT_FOUND)
            .with_metadata("panel", name)
    }

    /// Record lookup miss.
    pub fn record_not_found(panel: &str, id: &str) -> Self {
        Self::not_found(format!("record '{}' not found in '{}'", id, panel))
            .with_metadata("panel", panel)
            .with_metadata("id", id)
    }

    /// Form payload could not be decoded or was ambiguous.
    pub fn invalid_form(message: impl Into<String>) -> Self {
        Self::validation(text_codes::INVALID_FORM, message)
    }

    /// JSON body could not be decoded.
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::validation(text_codes::INVALID_JSON, message)
    }

    /// An operation needed a record id that was not supplied.
    pub fn id_required() -> Self {
        Self::validation(text_codes::ID_REQUIRED, "record id is required")
    }

    pub fn slug_required() -> Self {
        Self::validation(text_codes::SLUG_REQUIRED, "content type slug is required")
    }

    pub fn type_required() -> Self {
        Self::validation(
            text_codes::TYPE_REQUIRED,
            "content type identifier (content_type_id, id or slug) is required",
        )
    }

    pub fn schema_required(panel: &str) -> Self {
        Self::not_found(format!("no renderable schema for '{}'", panel))
            .with_text_code(text_codes::SCHEMA_REQUIRED)
            .with_metadata("panel", panel)
    }

    /// A configured feature flag is off.
    pub fn feature_disabled(feature: &str) -> Self {
        Self::forbidden(format!("feature '{}' is disabled", feature))
            .with_text_code(text_codes::FEATURE_DISABLED)
            .with_metadata("feature", feature)
    }

    pub fn content_service_unavailable() -> Self {
        Self::internal("content type service is not configured")
            .with_text_code(text_codes::CONTENT_SERVICE_UNAVAILABLE)
    }

    /// Permission denial for `permission` on `resource`.
    pub fn permission_denied(permission: &str, resource: &str) -> Self {
        Self::forbidden(format!("permission '{}' denied on '{}'", permission, resource))
            .with_metadata("permission", permission)
            .with_metadata("resource", resource)
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Structured body: `{code, text_code, category, message, metadata}`.
    pub fn to_body(&self) -> Value {
        serde_json::json!({
            "code": self.status_code(),
            "text_code": self.text_code,
            "category": self.kind.as_str(),
            "message": self.message,
            "metadata": self.metadata,
        })
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        AdminError::internal(err.to_string())
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::invalid_json(err.to_string())
    }
}

/// Result alias for console operations.
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Forbidden.status_code(), 403);
        assert_eq!(ErrorKind::Validation.status_code(), 400);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn test_body_shape() {
        let err = AdminError::invalid_form("field 'x' has conflicting values")
            .with_metadata("field", "x");
        let body = err.to_body();

        assert_eq!(body["code"], 400);
        assert_eq!(body["text_code"], "INVALID_FORM");
        assert_eq!(body["category"], "validation");
        assert_eq!(body["metadata"]["field"], "x");
    }

    #[test]
    fn test_panel_not_found_is_404() {
        let err = AdminError::panel_not_found("widgets");
        assert!(err.is_not_found());
        assert_eq!(err.text_code, Some(text_codes::PANEL_NOT_FOUND));
    }
}
