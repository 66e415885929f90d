//! Selection set for bulk actions
//!
//! Tracks which message ids are checked. Every id in the set must currently
//! exist in the store; callers prune via `retain_existing` when messages are
//! deleted. The set is cleared after any bulk operation commits.

use std::collections::HashSet;

use crate::types::Message;

#[derive(Debug, Default)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.ids.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    /// Flip one id in or out of the selection
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Select every message on the current page, unless all of them are
    /// already selected, in which case they are all deselected
    pub fn toggle_page(&mut self, page: &[Message]) {
        let all_selected = page.iter().all(|m| self.ids.contains(&m.id));
        if all_selected {
            for m in page {
                self.ids.remove(&m.id);
            }
        } else {
            for m in page {
                self.ids.insert(m.id.clone());
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Drop every id that no longer exists in the store
    pub fn retain_existing(&mut self, existing: &HashSet<String>) {
        self.ids.retain(|id| existing.contains(id));
    }

    /// Drop the given ids (e.g. ids the gateway confirmed deleted)
    pub fn remove_many(&mut self, ids: &HashSet<String>) {
        self.ids.retain(|id| !ids.contains(id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
