//! Zipped backup container
//!
//! ```text
//! backup.shelf (ZIP)
//! ├── manifest.json    # format version, app name, creation time, payload checksum
//! └── backup.json      # the serialized Backup (deflated)
//! ```
//!
//! The manifest is stored uncompressed so it can be inspected without
//! inflating the payload.

use super::decoder::BackupDecoder;
use super::types::Backup;
use crate::error::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use time::OffsetDateTime;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the manifest entry inside the container
pub const MANIFEST_FILE: &str = "manifest.json";

/// Name of the payload entry inside the container
pub const PAYLOAD_FILE: &str = "backup.json";

/// Current container format version
pub const FORMAT_VERSION_CURRENT: u32 = 1;

/// Oldest container format version this crate restores
pub const FORMAT_VERSION_MIN_SUPPORTED: u32 = 1;

/// Manifest stored next to the payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub version: u32,
    pub app_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// SHA-256 of the payload bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Decoder for zipped backup containers
#[derive(Debug, Clone)]
pub struct ArchiveDecoder {
    verify_checksum: bool,
}

impl Default for ArchiveDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveDecoder {
    /// Create a decoder that verifies the payload checksum
    #[must_use]
    pub fn new() -> Self {
        Self {
            verify_checksum: true,
        }
    }

    /// Set whether to verify the payload checksum against the manifest
    #[must_use]
    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Read only the manifest of a container
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be opened or has no valid manifest.
    pub fn read_manifest(&self, path: &Path) -> Result<ArchiveManifest> {
        let bytes = read_entry(path, MANIFEST_FILE)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl BackupDecoder for ArchiveDecoder {
    fn decode(&self, path: &Path) -> Result<Backup> {
        let manifest = self.read_manifest(path)?;

        if !(FORMAT_VERSION_MIN_SUPPORTED..=FORMAT_VERSION_CURRENT).contains(&manifest.version) {
            return Err(Error::UnsupportedVersion {
                found: manifest.version,
                min: FORMAT_VERSION_MIN_SUPPORTED,
                max: FORMAT_VERSION_CURRENT,
            });
        }

        let payload = read_entry(path, PAYLOAD_FILE)?;

        if self.verify_checksum {
            match manifest.sha256 {
                Some(expected) => {
                    let actual = sha256_hex(&payload);
                    if actual != expected {
                        warn!("Checksum mismatch in {}", path.display());
                        return Err(Error::ChecksumMismatch { expected, actual });
                    }
                    debug!("Checksum verified: {actual}");
                }
                None => debug!("No checksum in manifest, skipping verification"),
            }
        }

        Ok(serde_json::from_slice(&payload)?)
    }
}

/// Write a backup into a new container at `output_path`
///
/// # Errors
///
/// Returns an error if the backup cannot be serialized or the file cannot be written.
pub fn write_archive(backup: &Backup, app_name: &str, output_path: &Path) -> Result<()> {
    let payload = serde_json::to_vec(backup)?;
    let manifest = ArchiveManifest {
        version: FORMAT_VERSION_CURRENT,
        app_name: app_name.to_string(),
        created_at: OffsetDateTime::now_utc(),
        sha256: Some(sha256_hex(&payload)),
    };
    let manifest_json = serde_json::to_vec_pretty(&manifest)?;

    let file = File::create(output_path).map_err(|e| Error::FileWrite {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    let write_err = |e: std::io::Error| Error::FileWrite {
        path: output_path.to_path_buf(),
        source: e,
    };

    let mut zip = ZipWriter::new(file);

    zip.start_file(
        MANIFEST_FILE,
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
    )?;
    zip.write_all(&manifest_json).map_err(write_err)?;

    zip.start_file(
        PAYLOAD_FILE,
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
    )?;
    zip.write_all(&payload).map_err(write_err)?;

    zip.finish()?;
    debug!("Wrote backup container {}", output_path.display());
    Ok(())
}

fn read_entry(archive_path: &Path, name: &str) -> Result<Vec<u8>> {
    let file = File::open(archive_path).map_err(|e| Error::FileRead {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    let mut archive = ZipArchive::new(file)?;
    let mut entry = archive
        .by_name(name)
        .map_err(|e| Error::InvalidBackup(format!("'{name}' not found in container: {e}")))?;

    let mut contents = Vec::new();
    entry
        .read_to_end(&mut contents)
        .map_err(|e| Error::FileRead {
            path: archive_path.join(name),
            source: e,
        })?;

    Ok(contents)
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

// =============================================================================
// Tests
// =============================================================================
