//! Error log artifact written at the end of a run
//!
//! Plain UTF-8 text, one `[<timestamp>] <message>` line per error, no header.

use super::types::RestoreError;
use crate::config::RestoreConfig;
use crate::error::{Result, create_dir, write_file};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Writes accumulated restore errors to a file in the scratch directory
#[derive(Debug, Clone)]
pub struct ErrorLogWriter {
    path: PathBuf,
}

impl ErrorLogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &RestoreConfig) -> Self {
        Self::new(config.error_log_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `errors` and return where they went
    ///
    /// Returns `None` when there is nothing to write or the write failed;
    /// a failed write is only logged.
    pub fn write(&self, errors: &[RestoreError]) -> Option<PathBuf> {
        if errors.is_empty() {
            return None;
        }
        match self.try_write(errors) {
            Ok(()) => {
                debug!("Wrote {} restore errors to {}", errors.len(), self.path.display());
                Some(self.path.clone())
            }
            Err(e) => {
                warn!("Could not write restore error log: {e}");
                None
            }
        }
    }

    fn try_write(&self, errors: &[RestoreError]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_dir(parent)?;
        }
        let mut contents = String::new();
        for error in errors {
            contents.push_str(&error.to_log_line());
            contents.push('\n');
        }
        write_file(&self.path, contents)
    }
}
