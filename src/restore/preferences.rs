//! Preference restore
//!
//! Records without a matching live slot, or whose type differs from the
//! slot's, are skipped. None of that is an error: slots come and go between
//! app versions.

use super::types::{PreferenceOutcome, PreferenceReport, SkipReason};
use crate::backup::{BackupPreference, BackupSourcePreferences};
use crate::store::{PreferenceScope, PreferenceStore};
use log::debug;
use std::sync::Arc;

/// Prefix of keys holding transient app state
pub const APP_STATE_PREFIX: &str = "__APP_STATE_";

/// Prefix of keys that never leave the device
pub const PRIVATE_PREFIX: &str = "__PRIVATE_";

/// Restores application and source preferences
pub struct PreferenceRestorer {
    store: Arc<dyn PreferenceStore>,
}

impl PreferenceRestorer {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Apply application-scoped preferences
    pub fn restore_app_preferences(&self, prefs: &[BackupPreference]) -> PreferenceReport {
        let mut report = PreferenceReport::default();
        for pref in prefs {
            report.record(&self.restore_one(&PreferenceScope::App, pref));
        }
        debug!(
            "App preferences: {} applied, {} skipped",
            report.applied, report.skipped
        );
        report
    }

    /// Apply source-scoped preferences
    pub fn restore_source_preferences(&self, sources: &[BackupSourcePreferences]) -> PreferenceReport {
        let mut report = PreferenceReport::default();
        for source in sources {
            let scope = PreferenceScope::Source(source.source_key.clone());
            for pref in &source.prefs {
                report.record(&self.restore_one(&scope, pref));
            }
        }
        debug!(
            "Source preferences: {} applied, {} skipped",
            report.applied, report.skipped
        );
        report
    }

    /// Apply a single record if its live slot exists with the same type
    pub fn restore_one(&self, scope: &PreferenceScope, pref: &BackupPreference) -> PreferenceOutcome {
        let outcome = self.try_restore(scope, pref);
        if let PreferenceOutcome::Skipped(reason) = &outcome {
            debug!("Skipping preference '{}' in {scope:?}: {reason:?}", pref.key);
        }
        outcome
    }

    fn try_restore(&self, scope: &PreferenceScope, pref: &BackupPreference) -> PreferenceOutcome {
        if pref.key.starts_with(APP_STATE_PREFIX) || pref.key.starts_with(PRIVATE_PREFIX) {
            return PreferenceOutcome::Skipped(SkipReason::Internal);
        }

        let Some(found) = pref.value.kind() else {
            return PreferenceOutcome::Skipped(SkipReason::UnknownType);
        };

        let Some(expected) = self.store.slot_kind(scope, &pref.key) else {
            return PreferenceOutcome::Skipped(SkipReason::NoSlot);
        };

        if expected != found {
            return PreferenceOutcome::Skipped(SkipReason::TypeMismatch { expected, found });
        }

        match self.store.put(scope, &pref.key, &pref.value) {
            Ok(()) => PreferenceOutcome::Applied,
            Err(e) => PreferenceOutcome::Skipped(SkipReason::WriteFailed(e.to_string())),
        }
    }
}
