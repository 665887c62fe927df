//! Restore configuration

use std::path::PathBuf;
use time::UtcOffset;

/// Configuration for a [`Restorer`](crate::Restorer)
#[derive(Debug, Clone)]
pub struct RestoreConfig {
    /// Application name (used for the default scratch directory and log name)
    pub app_name: String,

    /// Directory where the error log is written
    pub scratch_dir: PathBuf,

    /// Filename of the error log
    pub error_log_name: String,

    /// Offset used for error timestamps
    pub utc_offset: UtcOffset,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        RestoreConfigBuilder::new("app").build()
    }
}

impl RestoreConfig {
    /// Create a new builder for RestoreConfig
    ///
    /// # Example
    /// ```rust
    /// use shelf_restore::RestoreConfig;
    ///
    /// let config = RestoreConfig::builder("tachiyomi")
    ///     .scratch_dir("/tmp/restore")
    ///     .build();
    /// assert_eq!(config.error_log_name, "tachiyomi_restore.txt");
    /// ```
    pub fn builder(app_name: impl Into<String>) -> RestoreConfigBuilder {
        RestoreConfigBuilder::new(app_name)
    }

    /// Full path of the error log
    pub fn error_log_path(&self) -> PathBuf {
        self.scratch_dir.join(&self.error_log_name)
    }
}

/// Builder for creating RestoreConfig with a fluent API
#[derive(Debug, Clone)]
pub struct RestoreConfigBuilder {
    app_name: String,
    scratch_dir: Option<PathBuf>,
    error_log_name: Option<String>,
    utc_offset: Option<UtcOffset>,
}

impl RestoreConfigBuilder {
    /// Create a new builder with the required app name
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            scratch_dir: None,
            error_log_name: None,
            utc_offset: None,
        }
    }

    /// Set the scratch directory for the error log
    ///
    /// Supports `~` expansion for home directory.
    pub fn scratch_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let expanded = if path.starts_with("~") {
            match dirs::home_dir() {
                Some(home) => home.join(path.strip_prefix("~").unwrap_or(&path)),
                None => path,
            }
        } else {
            path
        };
        self.scratch_dir = Some(expanded);
        self
    }

    /// Set the error log filename (default: "<app_name>_restore.txt")
    pub fn error_log_name(mut self, name: impl Into<String>) -> Self {
        self.error_log_name = Some(name.into());
        self
    }

    /// Set the offset of error timestamps
    ///
    /// Defaults to the local offset, read when the config is built. Reading
    /// it can fail once the process runs several threads; UTC is used then.
    pub fn utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    /// Build the configuration
    pub fn build(self) -> RestoreConfig {
        let scratch_dir = self.scratch_dir.unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join(&self.app_name))
                .unwrap_or_else(std::env::temp_dir)
        });
        let error_log_name = self
            .error_log_name
            .unwrap_or_else(|| format!("{}_restore.txt", self.app_name));

        let utc_offset = self
            .utc_offset
            .unwrap_or_else(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC));

        RestoreConfig {
            app_name: self.app_name,
            scratch_dir,
            error_log_name,
            utc_offset,
        }
    }
}
