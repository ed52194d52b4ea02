//! A file catalog mapping file IDs to their file names

use page::page_id::FileId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

/// Catalog holding the mappings between a `FileId` (a `u32`) and its corresponding filename (represented as a `PathBuf`)
#[derive(Debug)]
pub struct FileCatalog {
    mappings: RwLock<HashMap<FileId, PathBuf>>,
    next_id: AtomicU32,
}

impl Default for FileCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FileCatalog {
    /// Creates a new empty `FileCatalog`
    pub fn new() -> Self {
        Self {
            mappings: RwLock::new(HashMap::new()),
            // File id 0 is reserved so a zeroed PageId never aliases a real file.
            next_id: AtomicU32::new(1),
        }
    }

    /// Resolve a `file_id` to a file name
    ///
    /// # Params
    /// - `file_id` (`u32`): the ID of the file to resolve
    ///
    /// # Returns
    /// `Option<PathBuf>` containing a `PathBuf` for the file name, if the provided `file_id` was registered in the catalog
    pub fn get_file_name(&self, file_id: FileId) -> Option<PathBuf> {
        let guard = self
            .mappings
            .read()
            .expect("FileCatalog poisoned: another thread panicked while holding the lock");
        guard.get(&file_id).cloned()
    }

    /// Returns the id already registered for `path`, or assigns and registers
    /// a fresh one.
    pub fn register(&self, path: impl AsRef<Path>) -> FileId {
        let path = path.as_ref();
        let mut guard = self
            .mappings
            .write()
            .expect("FileCatalog poisoned: another thread panicked while holding the lock");

        if let Some((id, _)) = guard.iter().find(|(_, p)| p.as_path() == path) {
            return *id;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        guard.insert(id, path.to_path_buf());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_distinct_ids() {
        let catalog = FileCatalog::new();
        let a = catalog.register("a.db");
        let b = catalog.register("b.db");
        assert_ne!(a, b);
        assert_eq!(catalog.get_file_name(a).unwrap(), PathBuf::from("a.db"));
        assert_eq!(catalog.get_file_name(b).unwrap(), PathBuf::from("b.db"));
    }

    #[test]
    fn register_is_idempotent_per_path() {
        let catalog = FileCatalog::new();
        let a = catalog.register("same.db");
        let b = catalog.register("same.db");
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        let catalog = FileCatalog::new();
        assert!(catalog.get_file_name(99).is_none());
    }
}
