//! Restore orchestration
//!
//! A run decodes the backup, fixes the progress total from the options, and
//! runs every enabled domain as its own scoped thread:
//!
//! ```text
//! decode ──► categories ──(id mapping)──► manga entries
//!                      └─────────────────► anime entries
//!        ──► app preferences
//!        ──► source preferences
//!        ──► extensions
//! ```
//!
//! Domains share only the progress counter and the error accumulator of the
//! run. A failing entry is recorded and skipped; a failing single-unit domain
//! is recorded and does not report progress. Only a decode failure or
//! cancellation turns into an `Err`.

mod categories;
mod entries;
mod error_log;
mod extensions;
mod preferences;
mod progress;
mod types;

pub use categories::CategoryRestorer;
pub use entries::{EntryRestorer, merge_entry};
pub use error_log::ErrorLogWriter;
pub use extensions::ExtensionRestorer;
pub use preferences::{APP_STATE_PREFIX, PRIVATE_PREFIX, PreferenceRestorer};
pub use progress::{CancellationToken, ErrorCollector, ProgressTracker, RestoreContext};
pub use types::{
    CategoryMapping, CategoryOutcome, EntryOutcome, ExtensionOutcome, ExtensionReport,
    PreferenceOutcome, PreferenceReport, RestoreError, RestoreOptions, RestoreProgress,
    RestoreSummary, SkipReason,
};

use crate::backup::{Backup, BackupDecoder, Chapter, Episode};
use crate::config::RestoreConfig;
use crate::error::{Error, Result};
use crate::events::{LogNotifier, Notifier};
use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

/// Progress label of the category unit
pub const LABEL_CATEGORIES: &str = "Categories";
/// Progress label of the app preference unit
pub const LABEL_APP_SETTINGS: &str = "App settings";
/// Progress label of the source preference unit
pub const LABEL_SOURCE_SETTINGS: &str = "Source settings";
/// Progress label of the extension unit
pub const LABEL_EXTENSIONS: &str = "Extensions";

/// Restores backups into the live store
///
/// Built with [`Restorer::builder`]; every collaborator is injected.
///
/// # Example
///
/// ```rust,no_run
/// use shelf_restore::{
///     CategoryRestorer, EntryRestorer, ExtensionRestorer, PreferenceRestorer, RestoreConfig,
///     RestoreOptions, Restorer,
/// };
/// # use shelf_restore::*;
/// # use std::path::Path;
/// # use std::sync::Arc;
/// # fn stores() -> (Arc<dyn CategoryStore>, Arc<dyn CategoryStore>, Arc<dyn EntryStore<Chapter>>,
/// #     Arc<dyn EntryStore<Episode>>, Arc<dyn PreferenceStore>, Arc<dyn PluginInstaller>) { unimplemented!() }
/// # fn example() -> shelf_restore::Result<()> {
/// let (manga_categories, anime_categories, manga, anime, prefs, installer) = stores();
///
/// let restorer = Restorer::builder(RestoreConfig::builder("my-app").build())
///     .categories(CategoryRestorer::new(manga_categories, anime_categories))
///     .preferences(PreferenceRestorer::new(prefs))
///     .manga(EntryRestorer::new(manga, "manga"))
///     .anime(EntryRestorer::new(anime, "anime"))
///     .extensions(ExtensionRestorer::new(installer))
///     .build()?;
///
/// let summary = restorer.restore(Path::new("backup.json"), &RestoreOptions::new())?;
/// println!("{} errors", summary.error_count());
/// # Ok(())
/// # }
/// ```
pub struct Restorer {
    config: RestoreConfig,
    decoder: Arc<dyn BackupDecoder>,
    notifier: Arc<dyn Notifier>,
    categories: CategoryRestorer,
    preferences: PreferenceRestorer,
    manga: EntryRestorer<Chapter>,
    anime: EntryRestorer<Episode>,
    extensions: ExtensionRestorer,
    error_log: ErrorLogWriter,
}

impl Restorer {
    /// Create a builder for a restorer
    pub fn builder(config: RestoreConfig) -> RestorerBuilder {
        RestorerBuilder::new(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &RestoreConfig {
        &self.config
    }

    /// Restore the backup at `path`
    ///
    /// # Errors
    ///
    /// Returns an error only if the backup cannot be decoded. Per-item
    /// failures are reported in the summary.
    ///
    /// # Panics
    ///
    /// A panic inside a store or the notifier is not caught. It unwinds out
    /// of this call once the other domain tasks have finished.
    pub fn restore(&self, path: &Path, options: &RestoreOptions) -> Result<RestoreSummary> {
        self.restore_cancellable(path, options, &CancellationToken::new())
    }

    /// Restore the backup at `path`, stopping early once `token` is cancelled
    ///
    /// Work committed before cancellation is kept. A cancelled run writes no
    /// error log and does not call [`Notifier::on_complete`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be decoded, or
    /// [`Error::Cancelled`] if the run was cancelled.
    ///
    /// # Panics
    ///
    /// Same as [`Restorer::restore`].
    pub fn restore_cancellable(
        &self,
        path: &Path,
        options: &RestoreOptions,
        token: &CancellationToken,
    ) -> Result<RestoreSummary> {
        let start = Instant::now();
        info!("Restoring from backup: {}", path.display());

        let backup = self.decoder.decode(path).inspect_err(|e| {
            error!("Could not decode backup {}: {e}", path.display());
        })?;
        token.check()?;

        let total = options.total_units(&backup);
        debug!("Restore options {options:?}, {total} units");

        let ctx = RestoreContext::new(total, self.notifier.clone(), token.clone())
            .with_utc_offset(self.config.utc_offset);
        self.run_domains(&backup, options, &ctx);

        if token.is_cancelled() {
            info!(
                "Restore cancelled after {} of {total} units",
                ctx.progress.snapshot().completed
            );
            return Err(Error::Cancelled);
        }

        let errors = ctx.errors.drain();
        let log_path = self.error_log.write(&errors);
        let elapsed = start.elapsed();

        info!(
            "Restore complete in {elapsed:?}: {} errors",
            errors.len()
        );
        self.notifier
            .on_complete(elapsed, errors.len(), log_path.as_deref());

        Ok(RestoreSummary {
            elapsed,
            progress: ctx.progress.snapshot(),
            errors,
            log_path,
        })
    }

    fn run_domains(&self, backup: &Backup, options: &RestoreOptions, ctx: &RestoreContext) {
        let manga_names = backup.manga_source_names();
        let anime_names = backup.anime_source_names();

        thread::scope(|scope| {
            if options.library {
                let (manga_tx, manga_rx) = mpsc::channel();
                let (anime_tx, anime_rx) = mpsc::channel();

                scope.spawn(move || self.restore_categories(backup, ctx, manga_tx, anime_tx));
                scope.spawn(|| {
                    let mapping = await_mapping(manga_rx, "manga");
                    self.manga
                        .restore_batch(&backup.manga, &mapping, &manga_names, ctx);
                });
                scope.spawn(|| {
                    let mapping = await_mapping(anime_rx, "anime");
                    self.anime
                        .restore_batch(&backup.anime, &mapping, &anime_names, ctx);
                });
            }

            if options.app_settings {
                scope.spawn(|| {
                    self.run_unit(ctx, LABEL_APP_SETTINGS, || {
                        Ok(self.preferences.restore_app_preferences(&backup.preferences))
                    })
                });
            }

            if options.source_settings {
                scope.spawn(|| {
                    self.run_unit(ctx, LABEL_SOURCE_SETTINGS, || {
                        Ok(self
                            .preferences
                            .restore_source_preferences(&backup.source_preferences))
                    })
                });
            }

            if options.extensions {
                scope.spawn(|| {
                    self.run_unit(ctx, LABEL_EXTENSIONS, || {
                        Ok(self.extensions.restore_extensions(&backup.extensions))
                    })
                });
            }
        });
    }

    fn restore_categories(
        &self,
        backup: &Backup,
        ctx: &RestoreContext,
        manga_tx: Sender<CategoryMapping>,
        anime_tx: Sender<CategoryMapping>,
    ) {
        if ctx.is_cancelled() {
            debug!("Skipping {LABEL_CATEGORIES}: restore cancelled");
            return;
        }

        // The two sets are independent: a failing kind only loses its own mapping.
        let manga = category_set(ctx, "manga", || {
            self.categories.restore_manga_categories(&backup.categories)
        });
        let anime = category_set(ctx, "anime", || {
            self.categories
                .restore_anime_categories(&backup.anime_categories)
        });

        if manga.is_some() && anime.is_some() {
            ctx.progress.advance(LABEL_CATEGORIES);
        }

        // A dropped sender unblocks its entry batch with no mapping.
        if let Some(mapping) = manga {
            let _ = manga_tx.send(mapping);
        }
        if let Some(mapping) = anime {
            let _ = anime_tx.send(mapping);
        }
    }

    /// Run a single-unit domain: skip if cancelled, record on failure, advance on success
    fn run_unit<T>(
        &self,
        ctx: &RestoreContext,
        label: &str,
        work: impl FnOnce() -> Result<T>,
    ) -> Option<T> {
        if ctx.is_cancelled() {
            debug!("Skipping {label}: restore cancelled");
            return None;
        }
        match work() {
            Ok(value) => {
                ctx.progress.advance(label);
                Some(value)
            }
            Err(e) => {
                error!("{label} restore failed: {e}");
                ctx.errors.push(format!("{label}: {e}"));
                None
            }
        }
    }
}

/// Restore one category set, recording a failure under the category label
fn category_set(
    ctx: &RestoreContext,
    kind: &str,
    work: impl FnOnce() -> Result<CategoryMapping>,
) -> Option<CategoryMapping> {
    match work() {
        Ok(mapping) => Some(mapping),
        Err(e) => {
            error!("Restoring {kind} categories failed: {e}");
            ctx.errors.push(format!("{LABEL_CATEGORIES}: {e}"));
            None
        }
    }
}

fn await_mapping(receiver: Receiver<CategoryMapping>, kind: &str) -> CategoryMapping {
    receiver.recv().unwrap_or_else(|_| {
        warn!("No category mapping for {kind} entries, category assignments are dropped");
        CategoryMapping::default()
    })
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Restorer`]
pub struct RestorerBuilder {
    config: RestoreConfig,
    decoder: Option<Arc<dyn BackupDecoder>>,
    notifier: Option<Arc<dyn Notifier>>,
    categories: Option<CategoryRestorer>,
    preferences: Option<PreferenceRestorer>,
    manga: Option<EntryRestorer<Chapter>>,
    anime: Option<EntryRestorer<Episode>>,
    extensions: Option<ExtensionRestorer>,
    error_log: Option<ErrorLogWriter>,
}

impl RestorerBuilder {
    pub fn new(config: RestoreConfig) -> Self {
        Self {
            config,
            decoder: None,
            notifier: None,
            categories: None,
            preferences: None,
            manga: None,
            anime: None,
            extensions: None,
            error_log: None,
        }
    }

    /// Set the backup decoder (default: [`JsonDecoder`](crate::backup::JsonDecoder))
    pub fn decoder(mut self, decoder: impl BackupDecoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Set the progress notifier (default: [`LogNotifier`])
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Set a shared progress notifier
    pub fn shared_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn categories(mut self, restorer: CategoryRestorer) -> Self {
        self.categories = Some(restorer);
        self
    }

    pub fn preferences(mut self, restorer: PreferenceRestorer) -> Self {
        self.preferences = Some(restorer);
        self
    }

    pub fn manga(mut self, restorer: EntryRestorer<Chapter>) -> Self {
        self.manga = Some(restorer);
        self
    }

    pub fn anime(mut self, restorer: EntryRestorer<Episode>) -> Self {
        self.anime = Some(restorer);
        self
    }

    pub fn extensions(mut self, restorer: ExtensionRestorer) -> Self {
        self.extensions = Some(restorer);
        self
    }

    /// Override the error log writer (default: the config's error log path)
    pub fn error_log(mut self, writer: ErrorLogWriter) -> Self {
        self.error_log = Some(writer);
        self
    }

    /// Build the restorer
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a restorer or the decoder is missing.
    pub fn build(self) -> Result<Restorer> {
        let missing = |what: &str| Error::Config(format!("{what} restorer not set"));

        let decoder = match self.decoder {
            Some(decoder) => decoder,
            None => default_decoder()?,
        };
        let error_log = self
            .error_log
            .unwrap_or_else(|| ErrorLogWriter::from_config(&self.config));

        Ok(Restorer {
            decoder,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            categories: self.categories.ok_or_else(|| missing("category"))?,
            preferences: self.preferences.ok_or_else(|| missing("preference"))?,
            manga: self.manga.ok_or_else(|| missing("manga"))?,
            anime: self.anime.ok_or_else(|| missing("anime"))?,
            extensions: self.extensions.ok_or_else(|| missing("extension"))?,
            error_log,
            config: self.config,
        })
    }
}

#[cfg(feature = "json")]
fn default_decoder() -> Result<Arc<dyn BackupDecoder>> {
    Ok(Arc::new(crate::backup::JsonDecoder))
}

#[cfg(not(feature = "json"))]
fn default_decoder() -> Result<Arc<dyn BackupDecoder>> {
    Err(Error::Config("no backup decoder set".into()))
}
