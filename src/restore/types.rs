//! Restore options, results and per-domain outcomes

use crate::backup::{Backup, PreferenceKind};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset};
use time::macros::format_description;

// =============================================================================
// Options
// =============================================================================

/// Which restore domains to run
///
/// The switches also decide the progress total of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Library entries of both kinds and their categories
    pub library: bool,

    /// Application preferences
    pub app_settings: bool,

    /// Per-source preferences
    pub source_settings: bool,

    /// Extension installation requests
    pub extensions: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            library: true,
            app_settings: true,
            source_settings: true,
            extensions: true,
        }
    }
}

impl RestoreOptions {
    /// Everything enabled
    ///
    /// # Example
    /// ```rust
    /// use shelf_restore::RestoreOptions;
    ///
    /// let options = RestoreOptions::none().app_settings(true);
    /// assert!(options.any_enabled());
    /// assert!(!options.library);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything disabled
    #[must_use]
    pub fn none() -> Self {
        Self {
            library: false,
            app_settings: false,
            source_settings: false,
            extensions: false,
        }
    }

    /// Set whether to restore library entries and categories
    #[must_use]
    pub fn library(mut self, enabled: bool) -> Self {
        self.library = enabled;
        self
    }

    /// Set whether to restore application preferences
    #[must_use]
    pub fn app_settings(mut self, enabled: bool) -> Self {
        self.app_settings = enabled;
        self
    }

    /// Set whether to restore source preferences
    #[must_use]
    pub fn source_settings(mut self, enabled: bool) -> Self {
        self.source_settings = enabled;
        self
    }

    /// Set whether to request extension installs
    #[must_use]
    pub fn extensions(mut self, enabled: bool) -> Self {
        self.extensions = enabled;
        self
    }

    /// Whether at least one domain is enabled
    #[must_use]
    pub fn any_enabled(&self) -> bool {
        self.library || self.app_settings || self.source_settings || self.extensions
    }

    /// Number of progress units a run over `backup` will report
    ///
    /// Both category sets together count as one unit; every entry counts as one.
    #[must_use]
    pub fn total_units(&self, backup: &Backup) -> u64 {
        let mut total = 0;
        if self.library {
            total += 1 + backup.manga.len() as u64 + backup.anime.len() as u64;
        }
        if self.app_settings {
            total += 1;
        }
        if self.source_settings {
            total += 1;
        }
        if self.extensions {
            total += 1;
        }
        total
    }
}

// =============================================================================
// Errors and Summary
// =============================================================================

/// One recorded per-item failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreError {
    pub timestamp: OffsetDateTime,
    pub message: String,
}

impl RestoreError {
    /// Create an error stamped with the current time at `offset`
    pub fn now(message: impl Into<String>, offset: UtcOffset) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc().to_offset(offset),
            message: message.into(),
        }
    }

    /// Timestamp as `yyyy-MM-dd HH:mm:ss.SSS`
    #[must_use]
    pub fn formatted_timestamp(&self) -> String {
        let format = format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        );
        self.timestamp
            .format(&format)
            .unwrap_or_else(|_| self.timestamp.unix_timestamp().to_string())
    }

    /// The line written to the error log
    #[must_use]
    pub fn to_log_line(&self) -> String {
        format!("[{}] {}", self.formatted_timestamp(), self.message)
    }
}

/// Progress snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreProgress {
    pub completed: u64,
    pub total: u64,
}

/// Result of a finished restore run
#[derive(Debug, Clone)]
pub struct RestoreSummary {
    /// Wall time of the run, decoding included
    pub elapsed: Duration,

    /// Final progress; `completed == total` unless a single-unit domain failed
    pub progress: RestoreProgress,

    /// Per-item failures in insertion order
    pub errors: Vec<RestoreError>,

    /// Where the error log was written, if anything was written
    pub log_path: Option<PathBuf>,
}

impl RestoreSummary {
    /// Number of recorded failures
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Whether the run finished without recorded failures
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// =============================================================================
// Domain Outcomes
// =============================================================================

/// What happened to one backup category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// A live category with the same name already existed
    Reused(i64),
    /// A new live category was created
    Created(i64),
}

impl CategoryOutcome {
    /// Live id of the category
    #[must_use]
    pub fn id(self) -> i64 {
        match self {
            CategoryOutcome::Reused(id) | CategoryOutcome::Created(id) => id,
        }
    }
}

/// Backup category reference (`order`) to live category id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMapping {
    ids: HashMap<i64, i64>,
    pub created: usize,
    pub reused: usize,
}

impl CategoryMapping {
    pub(crate) fn record(&mut self, backup_ref: i64, outcome: CategoryOutcome) {
        match outcome {
            CategoryOutcome::Reused(_) => self.reused += 1,
            CategoryOutcome::Created(_) => self.created += 1,
        }
        self.ids.insert(backup_ref, outcome.id());
    }

    /// Live id for a backup category reference
    #[must_use]
    pub fn resolve(&self, backup_ref: i64) -> Option<i64> {
        self.ids.get(&backup_ref).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// What happened to one backup entry that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// No live entry existed; one was created
    Created(i64),
    /// Merged into an existing live entry
    Merged(i64),
}

/// Why a preference record was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No live slot with that key
    NoSlot,
    /// The live slot holds a different type
    TypeMismatch {
        expected: PreferenceKind,
        found: PreferenceKind,
    },
    /// App-state or private key, never restored
    Internal,
    /// The backup value has a type this crate does not know
    UnknownType,
    /// The store refused the write
    WriteFailed(String),
}

/// What happened to one preference record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceOutcome {
    Applied,
    Skipped(SkipReason),
}

/// Tally of a preference unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferenceReport {
    pub applied: usize,
    pub skipped: usize,
}

impl PreferenceReport {
    pub(crate) fn record(&mut self, outcome: &PreferenceOutcome) {
        match outcome {
            PreferenceOutcome::Applied => self.applied += 1,
            PreferenceOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// What happened to one extension record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionOutcome {
    /// An install request was sent
    Requested,
    /// The extension is already installed
    AlreadyInstalled,
}

/// Tally of the extension unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionReport {
    pub requested: usize,
    pub already_installed: usize,
}

// =============================================================================
// Tests
// =============================================================================
