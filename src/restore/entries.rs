//! Library entry restore, shared by both entry kinds
//!
//! One [`EntryRestorer`] is built per kind (`EntryRestorer<Chapter>` for manga,
//! `EntryRestorer<Episode>` for anime). A failing entry is recorded and the
//! batch moves on; entries already written stay written.

use super::progress::RestoreContext;
use super::types::{CategoryMapping, EntryOutcome};
use crate::backup::{EntryItem, EntryRecord};
use crate::error::Result;
use crate::store::EntryStore;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Restores library entries of one kind
pub struct EntryRestorer<I: EntryItem> {
    store: Arc<dyn EntryStore<I>>,
    kind: &'static str,
}

impl<I: EntryItem> EntryRestorer<I> {
    /// Create a restorer; `kind` only names the entries in log output
    pub fn new(store: Arc<dyn EntryStore<I>>, kind: &'static str) -> Self {
        Self { store, kind }
    }

    /// Order entries so the ones missing from the live library come first
    ///
    /// An interrupted restore then keeps as much new content as possible.
    /// Entries of equal priority keep their backup order.
    pub fn sort_by_new<'a>(&self, entries: &'a [EntryRecord<I>]) -> Vec<&'a EntryRecord<I>> {
        let mut keyed: Vec<(bool, &EntryRecord<I>)> = entries
            .iter()
            .map(|entry| (self.is_in_library(entry), entry))
            .collect();
        keyed.sort_by_key(|(in_library, _)| *in_library);
        keyed.into_iter().map(|(_, entry)| entry).collect()
    }

    fn is_in_library(&self, entry: &EntryRecord<I>) -> bool {
        matches!(
            self.store.find_entry(entry.source, &entry.url),
            Ok(Some(stored)) if stored.record.favorite
        )
    }

    /// Restore a whole batch, reporting one progress unit per entry
    ///
    /// Failures are recorded as `"<title> [<source name or id>]: <error>"`.
    /// Stops before the next entry once the run is cancelled.
    pub fn restore_batch(
        &self,
        entries: &[EntryRecord<I>],
        categories: &CategoryMapping,
        source_names: &HashMap<i64, String>,
        ctx: &RestoreContext,
    ) {
        let mut failed = 0usize;
        let mut restored = 0usize;

        for entry in self.sort_by_new(entries) {
            if ctx.is_cancelled() {
                debug!("{} restore cancelled after {restored} entries", self.kind);
                return;
            }

            match self.restore_entry(entry, categories) {
                Ok(_) => restored += 1,
                Err(e) => {
                    failed += 1;
                    let source = source_names
                        .get(&entry.source)
                        .cloned()
                        .unwrap_or_else(|| entry.source.to_string());
                    warn!("Failed to restore {} '{}': {e}", self.kind, entry.title);
                    ctx.errors.push(format!("{} [{source}]: {e}", entry.title));
                }
            }

            ctx.progress.advance(&entry.title);
        }

        info!(
            "Restored {restored} {} entries ({failed} failed)",
            self.kind
        );
    }

    /// Create or merge a single entry and assign its categories
    ///
    /// # Errors
    ///
    /// Returns the store error if the lookup, write or category assignment fails.
    pub fn restore_entry(
        &self,
        entry: &EntryRecord<I>,
        categories: &CategoryMapping,
    ) -> Result<EntryOutcome> {
        let (outcome, live_categories) = match self.store.find_entry(entry.source, &entry.url)? {
            Some(stored) => {
                let merged = merge_entry(entry, &stored.record);
                self.store.update_entry(stored.id, &merged)?;
                (EntryOutcome::Merged(stored.id), stored.record.categories)
            }
            None => {
                let record = EntryRecord {
                    categories: Vec::new(),
                    ..entry.clone()
                };
                let id = self.store.insert_entry(&record)?;
                (EntryOutcome::Created(id), Vec::new())
            }
        };

        let id = match outcome {
            EntryOutcome::Created(id) | EntryOutcome::Merged(id) => id,
        };

        let mut category_ids = live_categories.clone();
        for &reference in &entry.categories {
            match categories.resolve(reference) {
                Some(live_id) if !category_ids.contains(&live_id) => category_ids.push(live_id),
                Some(_) => {}
                None => debug!(
                    "Dropping unknown category reference {reference} of '{}'",
                    entry.title
                ),
            }
        }
        if category_ids != live_categories {
            self.store.set_entry_categories(id, &category_ids)?;
        }

        Ok(outcome)
    }
}

/// Merge a backup entry into the live one
///
/// Backup metadata wins only when strictly newer. Local-only user state
/// (favorite, read progress, earliest add date) is never lost.
pub fn merge_entry<I: EntryItem>(backup: &EntryRecord<I>, local: &EntryRecord<I>) -> EntryRecord<I> {
    let backup_newer = backup.last_modified_at > local.last_modified_at;
    let base = if backup_newer { backup } else { local };

    EntryRecord {
        source: local.source,
        url: local.url.clone(),
        title: base.title.clone(),
        artist: base.artist.clone(),
        author: base.author.clone(),
        description: base.description.clone(),
        genre: base.genre.clone(),
        status: base.status,
        thumbnail_url: base.thumbnail_url.clone(),
        favorite: backup.favorite || local.favorite,
        date_added: earliest_nonzero(backup.date_added, local.date_added),
        last_modified_at: backup.last_modified_at.max(local.last_modified_at),
        categories: local.categories.clone(),
        items: merge_items(&backup.items, &local.items),
    }
}

fn earliest_nonzero(a: i64, b: i64) -> i64 {
    match (a, b) {
        (0, other) | (other, 0) => other,
        (a, b) => a.min(b),
    }
}

fn merge_items<I: EntryItem>(backup: &[I], local: &[I]) -> Vec<I> {
    let mut merged = local.to_vec();
    let positions: HashMap<String, usize> = local
        .iter()
        .enumerate()
        .map(|(index, item)| (item.url().to_string(), index))
        .collect();

    for item in backup {
        match positions.get(item.url()) {
            Some(&index) => merged[index] = item.merge_into(&local[index]),
            None => merged.push(item.clone()),
        }
    }
    merged
}

// =============================================================================
// Tests
// =============================================================================
