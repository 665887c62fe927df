//! Seams to the live data store
//!
//! The restore core never owns storage. Hosts implement these traits over
//! their database; every method is expected to be atomic per call.

use crate::backup::{BackupExtension, EntryItem, EntryRecord, PreferenceKind, PreferenceValue};
use crate::error::Result;

// =============================================================================
// Categories
// =============================================================================

/// A category as it exists in the live store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub order: i64,
    pub flags: i64,
}

/// Category storage for one entry kind
pub trait CategoryStore: Send + Sync {
    /// All live categories
    fn categories(&self) -> Result<Vec<Category>>;

    /// Insert a category and return its new id
    fn insert_category(&self, name: &str, order: i64, flags: i64) -> Result<i64>;
}

// =============================================================================
// Entries
// =============================================================================

/// A live entry together with its store id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry<I> {
    pub id: i64,
    /// Live state; `categories` holds live category ids
    pub record: EntryRecord<I>,
}

/// Entry storage for one entry kind, keyed by source id + url
pub trait EntryStore<I: EntryItem>: Send + Sync {
    /// Find the live entry matching `source` and `url`
    fn find_entry(&self, source: i64, url: &str) -> Result<Option<StoredEntry<I>>>;

    /// Create a new entry (metadata and items) and return its id
    fn insert_entry(&self, record: &EntryRecord<I>) -> Result<i64>;

    /// Replace the metadata and items of an existing entry
    fn update_entry(&self, id: i64, record: &EntryRecord<I>) -> Result<()>;

    /// Replace the category assignments of an entry with live category ids
    fn set_entry_categories(&self, id: i64, category_ids: &[i64]) -> Result<()>;
}

// =============================================================================
// Preferences
// =============================================================================

/// Where a preference lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PreferenceScope {
    /// Application-wide preferences
    App,
    /// Preferences of a single source, by source key
    Source(String),
}

/// Typed key/value preference storage
pub trait PreferenceStore: Send + Sync {
    /// Declared type of the live slot, or `None` if no such slot exists
    fn slot_kind(&self, scope: &PreferenceScope, key: &str) -> Option<PreferenceKind>;

    /// Write a value into an existing slot
    fn put(&self, scope: &PreferenceScope, key: &str, value: &PreferenceValue) -> Result<()>;
}

// =============================================================================
// Extensions
// =============================================================================

/// External service that installs extensions
///
/// Requests are one-way: the restore never waits for installation.
pub trait PluginInstaller: Send + Sync {
    /// Whether the package is already installed
    fn is_installed(&self, _pkg_name: &str) -> bool {
        false
    }

    /// Queue an installation request
    fn request_install(&self, extension: BackupExtension);
}

/// Installer that forwards requests over a channel to whoever performs installs
pub struct ChannelInstaller {
    sender: std::sync::mpsc::Sender<BackupExtension>,
}

impl ChannelInstaller {
    /// Create an installer and the receiving end for the install worker
    #[must_use]
    pub fn channel() -> (Self, std::sync::mpsc::Receiver<BackupExtension>) {
        let (sender, receiver) = std::sync::mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl PluginInstaller for ChannelInstaller {
    fn request_install(&self, extension: BackupExtension) {
        let pkg_name = extension.pkg_name.clone();
        if self.sender.send(extension).is_err() {
            log::warn!("Install worker is gone, dropping request for {pkg_name}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_installer_forwards_requests() {
        let (installer, receiver) = ChannelInstaller::channel();

        installer.request_install(BackupExtension::new("eu.kanade.ext.one"));
        installer.request_install(BackupExtension::new("eu.kanade.ext.two"));

        let received: Vec<String> = receiver.try_iter().map(|e| e.pkg_name).collect();
        assert_eq!(received, vec!["eu.kanade.ext.one", "eu.kanade.ext.two"]);
    }

    #[test]
    fn test_channel_installer_survives_dropped_worker() {
        let (installer, receiver) = ChannelInstaller::channel();
        drop(receiver);

        installer.request_install(BackupExtension::new("eu.kanade.ext.orphan"));
        assert!(!installer.is_installed("eu.kanade.ext.orphan"));
    }
}
