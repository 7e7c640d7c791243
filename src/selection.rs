use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity -> last-known list index for the items a tab has marked.
///
/// Indices are a hint only. Anything that mutates the list (refresh, removal)
/// must call [`SelectionSet::bulk_set`] with freshly resolved positions.
#[derive(Debug, Default)]
pub struct SelectionSet {
    entries: Mutex<HashMap<String, usize>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn select(&self, id: &str, index: usize) {
        self.entries().insert(id.to_string(), index);
    }

    pub fn unselect(&self, id: &str) {
        self.entries().remove(id);
    }

    pub fn toggle(&self, id: &str, index: usize) -> bool {
        let mut entries = self.entries();
        if entries.remove(id).is_some() {
            false
        } else {
            entries.insert(id.to_string(), index);
            true
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.entries().contains_key(id)
    }

    pub fn selected_ids(&self) -> HashSet<String> {
        self.entries().keys().cloned().collect()
    }

    pub fn selected_indices(&self) -> HashSet<usize> {
        self.entries().values().copied().collect()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn count(&self) -> usize {
        self.entries().len()
    }

    pub fn bulk_set(&self, mapping: HashMap<String, usize>) {
        *self.entries() = mapping;
    }
}
