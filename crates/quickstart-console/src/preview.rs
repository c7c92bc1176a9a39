//! Preview tokens for unpublished records.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use quickstart_core::{AdminContext, AdminResult};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// What a preview token grants access to.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewGrant {
    pub panel: String,
    pub id: String,
    pub environment: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates preview tokens.
#[async_trait]
pub trait PreviewService: Send + Sync {
    async fn generate_token(&self, ctx: &AdminContext, panel: &str, id: &str) -> AdminResult<String>;

    /// The grant behind `token`, if it exists and has not expired.
    async fn validate(&self, token: &str) -> Option<PreviewGrant>;
}

/// In-process token store issuing random uuid tokens.
pub struct TokenPreviewService {
    ttl: Duration,
    grants: RwLock<HashMap<String, PreviewGrant>>,
}

impl TokenPreviewService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            grants: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for TokenPreviewService {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

#[async_trait]
impl PreviewService for TokenPreviewService {
    async fn generate_token(&self, ctx: &AdminContext, panel: &str, id: &str) -> AdminResult<String> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let grant = PreviewGrant {
            panel: quickstart_core::canonical_panel_name(panel).to_string(),
            id: id.to_string(),
            environment: ctx.environment().map(str::to_string),
            expires_at: now + self.ttl,
        };

        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        grants.retain(|_, g| g.expires_at > now);
        grants.insert(token.clone(), grant);
        tracing::debug!(panel = %panel, id = %id, "Issued preview token");
        Ok(token)
    }

    async fn validate(&self, token: &str) -> Option<PreviewGrant> {
        let grants = self.grants.read().unwrap_or_else(PoisonError::into_inner);
        grants
            .get(token)
            .filter(|g| g.expires_at > Utc::now())
            .cloned()
    }
}
