//! Error types for schema operations.

use quickstart_core::AdminError;

/// Errors raised while coercing form values against a schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoerceError {
    #[error("field '{path}': '{value}' is not a valid integer")]
    InvalidInteger { path: String, value: String },

    #[error("field '{path}': '{value}' is not a valid number")]
    InvalidNumber { path: String, value: String },

    #[error("field '{path}' has conflicting values: {values:?}")]
    ConflictingValues { path: String, values: Vec<String> },
}

impl CoerceError {
    pub fn path(&self) -> &str {
        match self {
            CoerceError::InvalidInteger { path, .. }
            | CoerceError::InvalidNumber { path, .. }
            | CoerceError::ConflictingValues { path, .. } => path,
        }
    }
}

impl From<CoerceError> for AdminError {
    fn from(err: CoerceError) -> Self {
        let path = err.path().to_string();
        AdminError::invalid_form(err.to_string()).with_metadata("field", path)
    }
}
