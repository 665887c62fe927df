//! Backup model and decoders

#[cfg(feature = "archive")]
mod archive;
mod decoder;
mod types;

#[cfg(feature = "archive")]
pub use archive::{
    ArchiveDecoder, ArchiveManifest, FORMAT_VERSION_CURRENT, FORMAT_VERSION_MIN_SUPPORTED,
    MANIFEST_FILE, PAYLOAD_FILE, write_archive,
};
#[cfg(feature = "json")]
pub use decoder::JsonDecoder;
pub use decoder::BackupDecoder;

pub use types::{
    Backup, BackupAnime, BackupCategory, BackupExtension, BackupManga, BackupPreference,
    BackupSource, BackupSourcePreferences, BrokenBackupSource, Chapter, EntryItem, EntryRecord,
    Episode, PreferenceKind, PreferenceValue,
};
