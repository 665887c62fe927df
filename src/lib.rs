//! # shelf-restore - Library Backup Restore
//!
//! Restores a reader/player application's library from a backup: categories,
//! manga and anime entries with their chapters and episodes, application and
//! per-source preferences, and extension installs.
//!
//! ## Features
//!
//! - **Merge, not overwrite**: Existing entries are merged field by field; read
//!   and watch progress is never lost
//! - **Category remapping**: Backup categories are matched by name and new ones
//!   are appended after the live ones
//! - **Per-item isolation**: A failing entry is recorded and skipped, the rest
//!   of the run continues
//! - **Concurrent domains**: Every enabled domain runs on its own thread with a
//!   shared, strictly increasing progress counter
//! - **Error log**: Failures are written to a plain text file at the end of the run
//! - **Cancellation**: Work committed before cancellation is kept
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shelf_restore::{
//!     CallbackNotifier, CategoryRestorer, EntryRestorer, ExtensionRestorer, PreferenceRestorer,
//!     RestoreConfig, RestoreOptions, Restorer,
//! };
//! use std::path::Path;
//!
//! # fn example() -> shelf_restore::Result<()> {
//! # use shelf_restore::*;
//! # use std::sync::Arc;
//! # fn stores() -> (Arc<dyn CategoryStore>, Arc<dyn CategoryStore>, Arc<dyn EntryStore<Chapter>>,
//! #     Arc<dyn EntryStore<Episode>>, Arc<dyn PreferenceStore>, Arc<dyn PluginInstaller>) { unimplemented!() }
//! let (manga_categories, anime_categories, manga, anime, prefs, installer) = stores();
//!
//! let config = RestoreConfig::builder("my-app")
//!     .scratch_dir("~/.cache/my-app")
//!     .build();
//!
//! let restorer = Restorer::builder(config)
//!     .categories(CategoryRestorer::new(manga_categories, anime_categories))
//!     .preferences(PreferenceRestorer::new(prefs))
//!     .manga(EntryRestorer::new(manga, "manga"))
//!     .anime(EntryRestorer::new(anime, "anime"))
//!     .extensions(ExtensionRestorer::new(installer))
//!     .notifier(
//!         CallbackNotifier::new()
//!             .with_progress(|label, done, total| println!("({done}/{total}) {label}")),
//!     )
//!     .build()?;
//!
//! let summary = restorer.restore(
//!     Path::new("backup.json"),
//!     &RestoreOptions::new().extensions(false),
//! )?;
//!
//! if let Some(log) = &summary.log_path {
//!     println!("{} errors, see {}", summary.error_count(), log.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Backup Archives
//!
//! With the `archive` feature (on by default), backups can also be read from a
//! zip archive holding a manifest and the JSON payload:
//!
//! ```rust,no_run
//! # #[cfg(feature = "archive")]
//! # fn example() -> shelf_restore::Result<()> {
//! use shelf_restore::backup::{ArchiveDecoder, Backup, write_archive};
//! use std::path::Path;
//!
//! write_archive(&Backup::default(), "my-app", Path::new("library.zip"))?;
//!
//! let decoder = ArchiveDecoder::new().verify_checksum(true);
//! let manifest = decoder.read_manifest(Path::new("library.zip"))?;
//! println!("Format version {}", manifest.version);
//! # Ok(())
//! # }
//! ```

mod error;
mod events;
mod sync;

pub mod backup;
pub mod config;
pub mod restore;
pub mod store;

pub use error::{Error, Result};
pub use events::{CallbackNotifier, CompleteCallback, LogNotifier, Notifier, ProgressCallback};

pub use config::{RestoreConfig, RestoreConfigBuilder};

pub use backup::{
    Backup, BackupAnime, BackupCategory, BackupDecoder, BackupExtension, BackupManga,
    BackupPreference, BackupSourcePreferences, Chapter, EntryItem, EntryRecord, Episode,
    PreferenceKind, PreferenceValue,
};

pub use store::{
    Category, CategoryStore, ChannelInstaller, EntryStore, PluginInstaller, PreferenceScope,
    PreferenceStore, StoredEntry,
};

pub use restore::{
    CancellationToken, CategoryMapping, CategoryRestorer, EntryRestorer, ErrorLogWriter,
    ExtensionRestorer, PreferenceRestorer, RestoreError, RestoreOptions, RestoreProgress,
    RestoreSummary, Restorer, RestorerBuilder,
};
