//! Turning a backup file into a [`Backup`]

use super::types::Backup;
use crate::error::Result;
use std::path::Path;

/// Decodes a backup source into the in-memory model
///
/// A decode failure is fatal for the restore run: nothing is restored.
pub trait BackupDecoder: Send + Sync {
    /// Decode the backup at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unreadable or malformed.
    fn decode(&self, path: &Path) -> Result<Backup>;
}

/// Decoder for plain JSON backups
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

#[cfg(feature = "json")]
impl BackupDecoder for JsonDecoder {
    fn decode(&self, path: &Path) -> Result<Backup> {
        let bytes = crate::error::read_file(path)?;
        log::debug!("Decoding {} bytes from {}", bytes.len(), path.display());
        Ok(serde_json::from_slice(&bytes)?)
    }
}
