//! Translation state read from records.
//!
//! Repositories that serve localized content annotate each record with the
//! locale that was asked for and the locale that was actually served. Editing
//! a record that is being served from another locale would overwrite that
//! locale's content, so updates to such records are refused.

use quickstart_core::record::{self, Record};
use quickstart_core::{AdminError, AdminResult, text_codes};
use serde::Serialize;
use serde_json::Value;

const META_SECTIONS: &[(&str, &str)] = &[("translation", "meta"), ("content_translation", "meta")];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranslationState {
    pub requested_locale: String,
    pub resolved_locale: String,
    pub missing_requested_locale: bool,
    pub fallback_used: bool,
    pub in_fallback_mode: bool,
}

impl TranslationState {
    /// Classify `record`.
    pub fn from_record(record: &Record) -> Self {
        let requested_locale = lookup(record, "requested_locale")
            .and_then(record::value_to_string)
            .unwrap_or_default();
        let resolved_locale = lookup(record, "resolved_locale")
            .and_then(record::value_to_string)
            .or_else(|| record::string_field(record, "locale"))
            .unwrap_or_default();

        let explicit_fallback = lookup(record, "fallback_used").is_some_and(record::truthy);
        let explicit_missing = lookup(record, "missing_requested_locale").is_some_and(record::truthy);

        let mismatch = !requested_locale.is_empty()
            && !resolved_locale.is_empty()
            && !requested_locale.eq_ignore_ascii_case(&resolved_locale);
        let fallback_used = explicit_fallback || mismatch;
        let missing_requested_locale = explicit_missing || fallback_used;

        Self {
            in_fallback_mode: fallback_used || missing_requested_locale,
            requested_locale,
            resolved_locale,
            missing_requested_locale,
            fallback_used,
        }
    }

    /// Whether the record carries any translation information at all.
    pub fn is_present(&self) -> bool {
        !self.requested_locale.is_empty() || !self.resolved_locale.is_empty() || self.in_fallback_mode
    }
}

/// Top level first, then each metadata section.
fn lookup<'a>(record: &'a Record, key: &str) -> Option<&'a Value> {
    if let Some(v) = record.get(key).filter(|v| !v.is_null()) {
        return Some(v);
    }
    META_SECTIONS.iter().find_map(|(section, meta)| {
        record::field(record, section)?
            .get(*meta)?
            .get(key)
            .filter(|v| !v.is_null())
    })
}

/// Refuse to update `existing` while it is served from a fallback locale.
pub fn guard_translation_update(panel: &str, id: &str, existing: &Record) -> AdminResult<()> {
    let state = TranslationState::from_record(existing);
    if !state.in_fallback_mode {
        return Ok(());
    }

    tracing::info!(
        panel = %panel,
        id = %id,
        requested_locale = %state.requested_locale,
        resolved_locale = %state.resolved_locale,
        "Blocked edit of fallback translation"
    );
    Err(AdminError::conflict(
        text_codes::TRANSLATION_FALLBACK_EDIT_BLOCKED,
        format!(
            "{} {} has no {} translation; create it before editing",
            panel,
            id,
            if state.requested_locale.is_empty() {
                "requested"
            } else {
                state.requested_locale.as_str()
            }
        ),
    )
    .with_metadata("panel", panel)
    .with_metadata("id", id)
    .with_metadata("requested_locale", state.requested_locale.clone())
    .with_metadata("resolved_locale", state.resolved_locale.clone())
    .with_metadata("fallback_used", state.fallback_used)
    .with_metadata("missing_requested_locale", state.missing_requested_locale))
}
