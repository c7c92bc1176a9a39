//! Feature gates.

use quickstart_core::{AdminError, AdminResult, FeaturesConfig};

/// Named console features that can be switched off.
pub mod features {
    pub const CONTENT_TYPE_BUILDER: &str = "content_type_builder";
    pub const PREVIEW: &str = "preview";
    pub const TRANSLATIONS: &str = "translations";
}

/// Answers whether a named feature is enabled.
#[derive(Debug, Clone, Default)]
pub struct FeatureGate {
    config: FeaturesConfig,
}

impl FeatureGate {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self, feature: &str) -> bool {
        self.config.is_enabled(feature)
    }

    /// `FEATURE_DISABLED` (403) when `feature` is off.
    pub fn require(&self, feature: &str) -> AdminResult<()> {
        if self.is_enabled(feature) {
            Ok(())
        } else {
            tracing::debug!(feature = %feature, "Feature disabled");
            Err(AdminError::feature_disabled(feature))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_feature() {
        let gate = FeatureGate::new(FeaturesConfig {
            content_type_builder: false,
            ..Default::default()
        });
        let err = gate.require(features::CONTENT_TYPE_BUILDER).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.text_code, Some("FEATURE_DISABLED"));
        assert!(gate.require(features::PREVIEW).is_ok());
    }
}
