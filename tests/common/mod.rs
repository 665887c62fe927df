//! Common test utilities for shelf-restore integration tests
//!
//! Provides in-memory stores, a recording notifier and a restorer fixture.

#![allow(dead_code)]

use shelf_restore::{
    Backup, BackupManga, CancellationToken, Category, CategoryRestorer, CategoryStore,
    ChannelInstaller, EntryItem, EntryRecord, EntryRestorer, EntryStore, Episode, Error,
    ExtensionRestorer, Notifier, PreferenceKind, PreferenceRestorer, PreferenceScope,
    PreferenceStore, PreferenceValue, RestoreConfig, Restorer, Result, StoredEntry, Chapter,
    BackupExtension,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use time::UtcOffset;
use time::macros::offset;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// In-memory Stores
// =============================================================================

#[derive(Default)]
pub struct MemoryCategoryStore {
    pub categories: Mutex<Vec<Category>>,
    pub fail_inserts: bool,
}

impl MemoryCategoryStore {
    pub fn with(names: &[&str]) -> Self {
        let categories = names
            .iter()
            .enumerate()
            .map(|(i, name)| Category {
                id: i as i64 + 1,
                name: name.to_string(),
                order: i as i64,
                flags: 0,
            })
            .collect();
        Self {
            categories: Mutex::new(categories),
            fail_inserts: false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.categories
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }
}

impl CategoryStore for MemoryCategoryStore {
    fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.lock().unwrap().clone())
    }

    fn insert_category(&self, name: &str, order: i64, flags: i64) -> Result<i64> {
        if self.fail_inserts {
            return Err(Error::Store("database is locked".into()));
        }
        let mut categories = self.categories.lock().unwrap();
        let id = categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        categories.push(Category {
            id,
            name: name.to_string(),
            order,
            flags,
        });
        Ok(id)
    }
}

/// Entry store that rejects entries from unknown sources
pub struct MemoryEntryStore<I> {
    pub entries: Mutex<Vec<StoredEntry<I>>>,
    pub known_sources: Vec<i64>,
}

impl<I: EntryItem> MemoryEntryStore<I> {
    pub fn new(known_sources: &[i64]) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            known_sources: known_sources.to_vec(),
        }
    }

    pub fn seed(&self, record: EntryRecord<I>) -> i64 {
        let mut entries = self.entries.lock().unwrap();
        let id = entries.len() as i64 + 1;
        entries.push(StoredEntry { id, record });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn get(&self, url: &str) -> Option<EntryRecord<I>> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.record.url == url)
            .map(|e| e.record.clone())
    }

    pub fn urls(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.record.url.clone())
            .collect()
    }
}

impl<I: EntryItem> EntryStore<I> for MemoryEntryStore<I> {
    fn find_entry(&self, source: i64, url: &str) -> Result<Option<StoredEntry<I>>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.record.source == source && e.record.url == url)
            .cloned())
    }

    fn insert_entry(&self, record: &EntryRecord<I>) -> Result<i64> {
        if !self.known_sources.contains(&record.source) {
            return Err(Error::SourceNotFound(record.source));
        }
        Ok(self.seed(record.clone()))
    }

    fn update_entry(&self, id: i64, record: &EntryRecord<I>) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let stored = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::Store(format!("no entry {id}")))?;
        let categories = std::mem::take(&mut stored.record.categories);
        stored.record = EntryRecord {
            categories,
            ..record.clone()
        };
        Ok(())
    }

    fn set_entry_categories(&self, id: i64, category_ids: &[i64]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let stored = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::Store(format!("no entry {id}")))?;
        stored.record.categories = category_ids.to_vec();
        Ok(())
    }
}

/// Entry store whose lookups panic, standing in for a broken host store
pub struct PanickingEntryStore;

impl EntryStore<Chapter> for PanickingEntryStore {
    fn find_entry(&self, _source: i64, _url: &str) -> Result<Option<StoredEntry<Chapter>>> {
        panic!("entry store crashed");
    }

    fn insert_entry(&self, _record: &EntryRecord<Chapter>) -> Result<i64> {
        panic!("entry store crashed");
    }

    fn update_entry(&self, _id: i64, _record: &EntryRecord<Chapter>) -> Result<()> {
        panic!("entry store crashed");
    }

    fn set_entry_categories(&self, _id: i64, _category_ids: &[i64]) -> Result<()> {
        panic!("entry store crashed");
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    pub slots: HashMap<(PreferenceScope, String), PreferenceKind>,
    pub values: Mutex<HashMap<(PreferenceScope, String), PreferenceValue>>,
}

impl MemoryPreferenceStore {
    pub fn slot(mut self, scope: PreferenceScope, key: &str, kind: PreferenceKind) -> Self {
        self.slots.insert((scope, key.to_string()), kind);
        self
    }

    pub fn value(&self, scope: PreferenceScope, key: &str) -> Option<PreferenceValue> {
        self.values
            .lock()
            .unwrap()
            .get(&(scope, key.to_string()))
            .cloned()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn slot_kind(&self, scope: &PreferenceScope, key: &str) -> Option<PreferenceKind> {
        self.slots.get(&(scope.clone(), key.to_string())).copied()
    }

    fn put(&self, scope: &PreferenceScope, key: &str, value: &PreferenceValue) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert((scope.clone(), key.to_string()), value.clone());
        Ok(())
    }
}

// =============================================================================
// Recording Notifier
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub error_count: usize,
    pub log_location: Option<PathBuf>,
}

/// Notifier that records every call and can cancel a run at a given count
#[derive(Default)]
pub struct RecordingNotifier {
    pub progress: Mutex<Vec<(String, u64, u64)>>,
    pub completions: Mutex<Vec<Completion>>,
    cancel_at: Option<(u64, CancellationToken)>,
}

impl RecordingNotifier {
    pub fn cancelling_at(completed: u64, token: CancellationToken) -> Self {
        Self {
            cancel_at: Some((completed, token)),
            ..Self::default()
        }
    }

    pub fn progress(&self) -> Vec<(String, u64, u64)> {
        self.progress.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<Completion> {
        self.completions.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn on_progress(&self, label: &str, completed: u64, total: u64) {
        self.progress
            .lock()
            .unwrap()
            .push((label.to_string(), completed, total));
        if let Some((at, token)) = &self.cancel_at {
            if completed == *at {
                token.cancel();
            }
        }
    }

    fn on_complete(&self, _elapsed: Duration, error_count: usize, log_location: Option<&Path>) {
        self.completions.lock().unwrap().push(Completion {
            error_count,
            log_location: log_location.map(Path::to_path_buf),
        });
    }
}

// =============================================================================
// Test Fixture
// =============================================================================

/// Source id every fixture store accepts
pub const KNOWN_SOURCE: i64 = 1;

/// Offset of error timestamps in fixture runs
pub const FIXTURE_OFFSET: UtcOffset = offset!(+2);

/// Restorer wired to in-memory stores inside a temporary scratch dir
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub manga_categories: Arc<MemoryCategoryStore>,
    pub anime_categories: Arc<MemoryCategoryStore>,
    pub manga: Arc<MemoryEntryStore<Chapter>>,
    pub anime: Arc<MemoryEntryStore<Episode>>,
    pub prefs: Arc<MemoryPreferenceStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub install_requests: Receiver<BackupExtension>,
    pub restorer: Restorer,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with(
            MemoryCategoryStore::default(),
            MemoryPreferenceStore::default(),
            RecordingNotifier::default(),
        )
    }

    pub fn with(
        manga_categories: MemoryCategoryStore,
        prefs: MemoryPreferenceStore,
        notifier: RecordingNotifier,
    ) -> Self {
        Self::with_categories(
            manga_categories,
            MemoryCategoryStore::default(),
            prefs,
            notifier,
        )
    }

    pub fn with_categories(
        manga_categories: MemoryCategoryStore,
        anime_categories: MemoryCategoryStore,
        prefs: MemoryPreferenceStore,
        notifier: RecordingNotifier,
    ) -> Self {
        init_logger();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let manga_categories = Arc::new(manga_categories);
        let anime_categories = Arc::new(anime_categories);
        let manga = Arc::new(MemoryEntryStore::new(&[KNOWN_SOURCE]));
        let anime = Arc::new(MemoryEntryStore::new(&[KNOWN_SOURCE]));
        let prefs = Arc::new(prefs);
        let notifier = Arc::new(notifier);
        let (installer, install_requests) = ChannelInstaller::channel();

        let config = RestoreConfig::builder("shelf-test")
            .scratch_dir(temp_dir.path())
            .utc_offset(FIXTURE_OFFSET)
            .build();

        let restorer = Restorer::builder(config)
            .categories(CategoryRestorer::new(
                manga_categories.clone(),
                anime_categories.clone(),
            ))
            .preferences(PreferenceRestorer::new(prefs.clone()))
            .manga(EntryRestorer::<Chapter>::new(manga.clone(), "manga"))
            .anime(EntryRestorer::<Episode>::new(anime.clone(), "anime"))
            .extensions(ExtensionRestorer::new(Arc::new(installer)))
            .shared_notifier(notifier.clone())
            .build()
            .expect("Failed to build restorer");

        Self {
            temp_dir,
            manga_categories,
            anime_categories,
            manga,
            anime,
            prefs,
            notifier,
            install_requests,
            restorer,
        }
    }

    /// Serialize `backup` as JSON into the temp dir and return its path
    pub fn write_backup(&self, backup: &Backup) -> PathBuf {
        let path = self.temp_dir.path().join("backup.json");
        std::fs::write(&path, serde_json::to_vec(backup).unwrap()).unwrap();
        path
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.restorer.config().error_log_path()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

pub fn manga(url: &str, title: &str) -> BackupManga {
    BackupManga::new(KNOWN_SOURCE, url, title)
}

/// Backup holding `count` manga from the known source
pub fn manga_backup(count: usize) -> Backup {
    Backup {
        manga: (1..=count)
            .map(|i| manga(&format!("/manga/{i}"), &format!("Manga {i}")))
            .collect(),
        ..Backup::default()
    }
}
