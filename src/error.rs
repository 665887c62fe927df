//! Error types for shelf-restore

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for shelf-restore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shelf-restore
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Decoding Errors
    // -------------------------------------------------------------------------
    #[error("Failed to decode backup data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Unsupported backup format version {found} (supported: {min}-{max})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },

    #[error("Backup checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[cfg(feature = "archive")]
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Store(String),

    #[error("Source not found: {0}")]
    SourceNotFound(i64),

    #[error("Category '{0}' already exists")]
    CategoryConflict(String),

    // -------------------------------------------------------------------------
    // Run Control
    // -------------------------------------------------------------------------
    #[error("Restore was cancelled")]
    Cancelled,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this error means the backup itself could not be decoded.
    ///
    /// These are the only errors that abort a restore before any data is touched.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        #[cfg(feature = "archive")]
        if matches!(self, Error::Zip(_)) {
            return true;
        }
        matches!(
            self,
            Error::FileRead { .. }
                | Error::Serialize(_)
                | Error::InvalidBackup(_)
                | Error::UnsupportedVersion { .. }
                | Error::ChecksumMismatch { .. }
        )
    }

    /// Check if this error is the result of a cancelled run
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

// =============================================================================
// Filesystem Helper Functions
// =============================================================================

/// Create a directory (and parents) with proper error handling
pub fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreate {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a whole file with proper error handling
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write content to a file with proper error handling
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_errors_are_fatal() {
        let err = Error::InvalidBackup("truncated".into());
        assert!(err.is_fatal());

        let err = Error::UnsupportedVersion {
            found: 9,
            min: 1,
            max: 1,
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_store_errors_are_not_fatal() {
        assert!(!Error::SourceNotFound(42).is_fatal());
        assert!(!Error::Store("constraint failed".into()).is_fatal());
        assert!(!Error::Cancelled.is_fatal());
        assert!(Error::Cancelled.is_cancelled());
    }

    #[test]
    fn test_store_message_is_verbatim() {
        let err = Error::Store("UNIQUE constraint failed: mangas.url".into());
        assert_eq!(err.to_string(), "UNIQUE constraint failed: mangas.url");
    }
}
