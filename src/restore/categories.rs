//! Category restore
//!
//! Categories are matched by name. Ids in the backup are only references used
//! by the backup's entries and never reach the live store.

use super::types::{CategoryMapping, CategoryOutcome};
use crate::backup::BackupCategory;
use crate::error::Result;
use crate::store::CategoryStore;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Restores the category sets of both entry kinds
pub struct CategoryRestorer {
    manga: Arc<dyn CategoryStore>,
    anime: Arc<dyn CategoryStore>,
}

impl CategoryRestorer {
    pub fn new(manga: Arc<dyn CategoryStore>, anime: Arc<dyn CategoryStore>) -> Self {
        Self { manga, anime }
    }

    /// Merge the manga categories of a backup into the live set
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to list or insert categories.
    pub fn restore_manga_categories(&self, backup: &[BackupCategory]) -> Result<CategoryMapping> {
        restore_into(self.manga.as_ref(), backup)
    }

    /// Merge the anime categories of a backup into the live set
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to list or insert categories.
    pub fn restore_anime_categories(&self, backup: &[BackupCategory]) -> Result<CategoryMapping> {
        restore_into(self.anime.as_ref(), backup)
    }
}

fn restore_into(store: &dyn CategoryStore, backup: &[BackupCategory]) -> Result<CategoryMapping> {
    let live = store.categories()?;
    let mut by_name: HashMap<String, i64> = live.iter().map(|c| (c.name.clone(), c.id)).collect();
    let mut next_order = live.iter().map(|c| c.order).max().unwrap_or(0);

    let mut sorted: Vec<&BackupCategory> = backup.iter().collect();
    sorted.sort_by_key(|c| c.order);

    let mut mapping = CategoryMapping::default();
    for category in sorted {
        let outcome = match by_name.get(&category.name) {
            Some(&id) => CategoryOutcome::Reused(id),
            None => {
                next_order += 1;
                let id = store.insert_category(&category.name, next_order, category.flags)?;
                by_name.insert(category.name.clone(), id);
                CategoryOutcome::Created(id)
            }
        };
        mapping.record(category.order, outcome);
    }

    debug!(
        "Categories restored: {} created, {} reused",
        mapping.created, mapping.reused
    );
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::Category;
    use std::sync::Mutex;

    #[derive(Default)]
    struct VecStore {
        categories: Mutex<Vec<Category>>,
    }

    impl CategoryStore for VecStore {
        fn categories(&self) -> Result<Vec<Category>> {
            Ok(self.categories.lock().unwrap().clone())
        }

        fn insert_category(&self, name: &str, order: i64, flags: i64) -> Result<i64> {
            let mut categories = self.categories.lock().unwrap();
            if categories.iter().any(|c| c.name == name) {
                return Err(Error::CategoryConflict(name.to_string()));
            }
            let id = categories.len() as i64 + 1;
            categories.push(Category {
                id,
                name: name.to_string(),
                order,
                flags,
            });
            Ok(id)
        }
    }

    fn names(store: &VecStore) -> Vec<String> {
        store
            .categories
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    #[test]
    fn test_creates_in_backup_order_after_existing() {
        let store = VecStore::default();
        store.insert_category("Reading", 5, 0).unwrap();

        let backup = vec![
            BackupCategory::new("Completed", 2),
            BackupCategory::new("Plan to read", 1),
        ];
        let mapping = restore_into(&store, &backup).unwrap();

        assert_eq!(names(&store), vec!["Reading", "Plan to read", "Completed"]);
        let orders: Vec<i64> = store
            .categories
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.order)
            .collect();
        assert_eq!(orders, vec![5, 6, 7]);
        assert_eq!(mapping.resolve(1), Some(2));
        assert_eq!(mapping.resolve(2), Some(3));
    }

    #[test]
    fn test_reuses_existing_names() {
        let store = VecStore::default();
        let reading = store.insert_category("Reading", 1, 0).unwrap();

        let mapping = restore_into(&store, &[BackupCategory::new("Reading", 9)]).unwrap();

        assert_eq!(mapping.resolve(9), Some(reading));
        assert_eq!((mapping.created, mapping.reused), (0, 1));
        assert_eq!(names(&store), vec!["Reading"]);
    }

    #[test]
    fn test_duplicate_names_inside_backup() {
        let store = VecStore::default();
        let backup = vec![BackupCategory::new("Same", 1), BackupCategory::new("Same", 2)];

        let mapping = restore_into(&store, &backup).unwrap();

        assert_eq!(names(&store), vec!["Same"]);
        assert_eq!(mapping.resolve(1), mapping.resolve(2));
    }

    #[test]
    fn test_kinds_are_independent() {
        let manga = Arc::new(VecStore::default());
        let anime = Arc::new(VecStore::default());
        let restorer = CategoryRestorer::new(manga.clone(), anime.clone());

        restorer
            .restore_manga_categories(&[BackupCategory::new("Manga only", 1)])
            .unwrap();
        restorer
            .restore_anime_categories(&[BackupCategory::new("Anime only", 1)])
            .unwrap();

        assert_eq!(names(&manga), vec!["Manga only"]);
        assert_eq!(names(&anime), vec!["Anime only"]);
    }
}
