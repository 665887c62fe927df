//! Progress and completion notifications
//!
//! Restore tasks run concurrently, so progress labels from different domains
//! interleave. `completed` is never observed going backwards.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Receives progress of a restore run
pub trait Notifier: Send + Sync {
    /// One more unit finished. `label` names the domain or the entry title.
    fn on_progress(&self, label: &str, completed: u64, total: u64);

    /// The run finished (not called for cancelled runs)
    fn on_complete(&self, elapsed: Duration, error_count: usize, log_location: Option<&Path>);
}

/// Notifier that only writes to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn on_progress(&self, label: &str, completed: u64, total: u64) {
        log::info!("Restoring ({completed}/{total}): {label}");
    }

    fn on_complete(&self, elapsed: Duration, error_count: usize, log_location: Option<&Path>) {
        match log_location {
            Some(path) => log::info!(
                "Restore finished in {elapsed:?} with {error_count} error(s), see {}",
                path.display()
            ),
            None => log::info!("Restore finished in {elapsed:?} with {error_count} error(s)"),
        }
    }
}

/// Type alias for a progress callback
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// Type alias for a completion callback
pub type CompleteCallback = Arc<dyn Fn(Duration, usize, Option<&Path>) + Send + Sync>;

/// Notifier assembled from closures
///
/// # Example
///
/// ```
/// use shelf_restore::CallbackNotifier;
///
/// let notifier = CallbackNotifier::new()
///     .with_progress(|label, done, total| println!("{done}/{total} {label}"))
///     .with_complete(|elapsed, errors, _log| println!("done in {elapsed:?}, {errors} errors"));
/// ```
#[derive(Clone, Default)]
pub struct CallbackNotifier {
    progress: Option<ProgressCallback>,
    complete: Option<CompleteCallback>,
}

impl std::fmt::Debug for CallbackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackNotifier")
            .field("progress", &self.progress.as_ref().map(|_| "Some(Fn)"))
            .field("complete", &self.complete.as_ref().map(|_| "Some(Fn)"))
            .finish()
    }
}

impl CallbackNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the progress callback, receiving (`label`, `completed`, `total`)
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, u64, u64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Set the completion callback, receiving (`elapsed`, `error_count`, `log_location`)
    #[must_use]
    pub fn with_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(Duration, usize, Option<&Path>) + Send + Sync + 'static,
    {
        self.complete = Some(Arc::new(callback));
        self
    }
}

impl Notifier for CallbackNotifier {
    fn on_progress(&self, label: &str, completed: u64, total: u64) {
        if let Some(callback) = &self.progress {
            callback(label, completed, total);
        }
    }

    fn on_complete(&self, elapsed: Duration, error_count: usize, log_location: Option<&Path>) {
        if let Some(callback) = &self.complete {
            callback(elapsed, error_count, log_location);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
