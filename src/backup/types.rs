//! Decoded backup model
//!
//! A [`Backup`] is an immutable snapshot produced by a [`BackupDecoder`](super::BackupDecoder).
//! Restorers only ever borrow it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// =============================================================================
// Backup Aggregate
// =============================================================================

/// The whole decoded backup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backup {
    /// Manga library entries
    pub manga: Vec<BackupManga>,

    /// Categories referenced by manga entries
    pub categories: Vec<BackupCategory>,

    /// Anime library entries
    pub anime: Vec<BackupAnime>,

    /// Categories referenced by anime entries
    pub anime_categories: Vec<BackupCategory>,

    /// Manga sources known when the backup was created
    pub sources: Vec<BackupSource>,

    /// Manga sources stored in the legacy format
    pub broken_sources: Vec<BrokenBackupSource>,

    /// Anime sources known when the backup was created
    pub anime_sources: Vec<BackupSource>,

    /// Anime sources stored in the legacy format
    pub broken_anime_sources: Vec<BrokenBackupSource>,

    /// Application-scoped preferences
    pub preferences: Vec<BackupPreference>,

    /// Preferences scoped to a single source
    pub source_preferences: Vec<BackupSourcePreferences>,

    /// Installed extensions
    pub extensions: Vec<BackupExtension>,
}

impl Backup {
    /// Source id to display name lookup for manga entries
    #[must_use]
    pub fn manga_source_names(&self) -> HashMap<i64, String> {
        source_names(&self.sources, &self.broken_sources)
    }

    /// Source id to display name lookup for anime entries
    #[must_use]
    pub fn anime_source_names(&self) -> HashMap<i64, String> {
        source_names(&self.anime_sources, &self.broken_anime_sources)
    }
}

fn source_names(sources: &[BackupSource], broken: &[BrokenBackupSource]) -> HashMap<i64, String> {
    sources
        .iter()
        .cloned()
        .chain(broken.iter().cloned().map(BackupSource::from))
        .map(|s| (s.source_id, s.name))
        .collect()
}

// =============================================================================
// Sources
// =============================================================================

/// A source referenced by backup entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSource {
    pub source_id: i64,
    #[serde(default)]
    pub name: String,
}

/// Source reference written by older app versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenBackupSource {
    #[serde(default)]
    pub name: String,
    pub source_id: i64,
}

impl From<BrokenBackupSource> for BackupSource {
    fn from(broken: BrokenBackupSource) -> Self {
        Self {
            source_id: broken.source_id,
            name: broken.name,
        }
    }
}

// =============================================================================
// Categories
// =============================================================================

/// A category as stored in the backup
///
/// `order` doubles as the category's identifier inside the backup: entries
/// reference their categories by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupCategory {
    pub name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub flags: i64,
}

impl BackupCategory {
    pub fn new(name: impl Into<String>, order: i64) -> Self {
        Self {
            name: name.into(),
            order,
            flags: 0,
        }
    }
}

// =============================================================================
// Library Entries
// =============================================================================

/// Per-item user state carried by an entry (chapters of a manga, episodes of an anime)
///
/// Items are matched against the live ones by [`url`](EntryItem::url).
pub trait EntryItem: Clone + Send + Sync {
    /// Stable identifier of the item within its entry
    fn url(&self) -> &str;

    /// Last modification timestamp (epoch seconds)
    fn last_modified_at(&self) -> i64;

    /// Merge this backup item with the local one, keeping local progress
    /// unless this item is strictly newer.
    #[must_use]
    fn merge_into(&self, local: &Self) -> Self;
}

/// One library entry of either kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord<I> {
    pub source: i64,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub date_added: i64,
    #[serde(default)]
    pub last_modified_at: i64,
    /// Backup category references (`BackupCategory::order`)
    #[serde(default)]
    pub categories: Vec<i64>,
    #[serde(default = "Vec::new")]
    pub items: Vec<I>,
}

impl<I> EntryRecord<I> {
    /// Create an entry with only its identity set
    pub fn new(source: i64, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source,
            url: url.into(),
            title: title.into(),
            artist: None,
            author: None,
            description: None,
            genre: Vec::new(),
            status: 0,
            thumbnail_url: None,
            favorite: true,
            date_added: 0,
            last_modified_at: 0,
            categories: Vec::new(),
            items: Vec::new(),
        }
    }
}

/// A manga chapter with its reading state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scanlator: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub bookmark: bool,
    #[serde(default)]
    pub last_page_read: i64,
    #[serde(default)]
    pub chapter_number: f64,
    #[serde(default)]
    pub date_upload: i64,
    #[serde(default)]
    pub last_modified_at: i64,
}

impl Chapter {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            scanlator: None,
            read: false,
            bookmark: false,
            last_page_read: 0,
            chapter_number: -1.0,
            date_upload: 0,
            last_modified_at: 0,
        }
    }
}

impl EntryItem for Chapter {
    fn url(&self) -> &str {
        &self.url
    }

    fn last_modified_at(&self) -> i64 {
        self.last_modified_at
    }

    fn merge_into(&self, local: &Self) -> Self {
        let newer = self.last_modified_at > local.last_modified_at;
        let last_page_read = if newer || local.last_page_read == 0 {
            self.last_page_read
        } else {
            local.last_page_read
        };
        Self {
            read: self.read || local.read,
            bookmark: self.bookmark || local.bookmark,
            last_page_read,
            last_modified_at: self.last_modified_at.max(local.last_modified_at),
            ..self.clone()
        }
    }
}

/// An anime episode with its watching state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scanlator: Option<String>,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub bookmark: bool,
    #[serde(default)]
    pub last_second_seen: i64,
    #[serde(default)]
    pub total_seconds: i64,
    #[serde(default)]
    pub episode_number: f64,
    #[serde(default)]
    pub date_upload: i64,
    #[serde(default)]
    pub last_modified_at: i64,
}

impl Episode {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            scanlator: None,
            seen: false,
            bookmark: false,
            last_second_seen: 0,
            total_seconds: 0,
            episode_number: -1.0,
            date_upload: 0,
            last_modified_at: 0,
        }
    }
}

impl EntryItem for Episode {
    fn url(&self) -> &str {
        &self.url
    }

    fn last_modified_at(&self) -> i64 {
        self.last_modified_at
    }

    fn merge_into(&self, local: &Self) -> Self {
        let newer = self.last_modified_at > local.last_modified_at;
        let (last_second_seen, total_seconds) = if newer || local.last_second_seen == 0 {
            (self.last_second_seen, self.total_seconds.max(local.total_seconds))
        } else {
            (local.last_second_seen, local.total_seconds)
        };
        Self {
            seen: self.seen || local.seen,
            bookmark: self.bookmark || local.bookmark,
            last_second_seen,
            total_seconds,
            last_modified_at: self.last_modified_at.max(local.last_modified_at),
            ..self.clone()
        }
    }
}

/// Manga entry as stored in a backup
pub type BackupManga = EntryRecord<Chapter>;

/// Anime entry as stored in a backup
pub type BackupAnime = EntryRecord<Episode>;

// =============================================================================
// Preferences
// =============================================================================

/// Type of a preference value or of a live preference slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceKind {
    Int,
    Long,
    Float,
    String,
    Boolean,
    StringSet,
}

/// A typed preference value
///
/// Values whose `type` tag is unknown, or whose payload does not fit the
/// tag, decode as [`PreferenceValue::Unknown`] instead of failing the backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePreferenceValue", into = "WirePreferenceValue")]
pub enum PreferenceValue {
    Int(i32),
    Long(i64),
    Float(f32),
    String(String),
    Boolean(bool),
    StringSet(BTreeSet<String>),
    /// Raw value of a type this crate cannot restore
    Unknown(serde_json::Value),
}

impl PreferenceValue {
    /// The declared type of this value, `None` for [`PreferenceValue::Unknown`]
    #[must_use]
    pub fn kind(&self) -> Option<PreferenceKind> {
        let kind = match self {
            PreferenceValue::Int(_) => PreferenceKind::Int,
            PreferenceValue::Long(_) => PreferenceKind::Long,
            PreferenceValue::Float(_) => PreferenceKind::Float,
            PreferenceValue::String(_) => PreferenceKind::String,
            PreferenceValue::Boolean(_) => PreferenceKind::Boolean,
            PreferenceValue::StringSet(_) => PreferenceKind::StringSet,
            PreferenceValue::Unknown(_) => return None,
        };
        Some(kind)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
enum TypedValue {
    Int(i32),
    Long(i64),
    Float(f32),
    String(String),
    Boolean(bool),
    StringSet(BTreeSet<String>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WirePreferenceValue {
    Typed(TypedValue),
    Unknown(serde_json::Value),
}

impl From<WirePreferenceValue> for PreferenceValue {
    fn from(wire: WirePreferenceValue) -> Self {
        match wire {
            WirePreferenceValue::Typed(TypedValue::Int(v)) => PreferenceValue::Int(v),
            WirePreferenceValue::Typed(TypedValue::Long(v)) => PreferenceValue::Long(v),
            WirePreferenceValue::Typed(TypedValue::Float(v)) => PreferenceValue::Float(v),
            WirePreferenceValue::Typed(TypedValue::String(v)) => PreferenceValue::String(v),
            WirePreferenceValue::Typed(TypedValue::Boolean(v)) => PreferenceValue::Boolean(v),
            WirePreferenceValue::Typed(TypedValue::StringSet(v)) => PreferenceValue::StringSet(v),
            WirePreferenceValue::Unknown(raw) => PreferenceValue::Unknown(raw),
        }
    }
}

impl From<PreferenceValue> for WirePreferenceValue {
    fn from(value: PreferenceValue) -> Self {
        let typed = match value {
            PreferenceValue::Int(v) => TypedValue::Int(v),
            PreferenceValue::Long(v) => TypedValue::Long(v),
            PreferenceValue::Float(v) => TypedValue::Float(v),
            PreferenceValue::String(v) => TypedValue::String(v),
            PreferenceValue::Boolean(v) => TypedValue::Boolean(v),
            PreferenceValue::StringSet(v) => TypedValue::StringSet(v),
            PreferenceValue::Unknown(raw) => return WirePreferenceValue::Unknown(raw),
        };
        WirePreferenceValue::Typed(typed)
    }
}

/// A single preference record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupPreference {
    pub key: String,
    pub value: PreferenceValue,
}

impl BackupPreference {
    pub fn new(key: impl Into<String>, value: PreferenceValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Preferences belonging to one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSourcePreferences {
    pub source_key: String,
    #[serde(default)]
    pub prefs: Vec<BackupPreference>,
}

// =============================================================================
// Extensions
// =============================================================================

/// An extension (plugin) that was installed when the backup was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupExtension {
    pub pkg_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version_code: i64,
    /// Package bytes, when the backup embedded them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
}

impl BackupExtension {
    pub fn new(pkg_name: impl Into<String>) -> Self {
        let pkg_name = pkg_name.into();
        Self {
            name: pkg_name.clone(),
            pkg_name,
            version_code: 0,
            payload: Vec::new(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
