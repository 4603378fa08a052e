use std::sync::Arc;

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::feed::model::Entry;

/// A feed's entries keyed by identity, in first-seen order.
///
/// When two entries share an id the later one replaces the earlier value but
/// the key keeps the position of its first occurrence.
#[derive(Debug, Default)]
pub struct EntryIndex {
    by_id: IndexMap<String, Arc<Entry>>,
}

impl EntryIndex {
    pub(crate) fn build(entries: &[Arc<Entry>]) -> Self {
        let mut by_id = IndexMap::with_capacity(entries.len());
        for entry in entries {
            by_id.insert(entry_key(entry), Arc::clone(entry));
        }
        Self { by_id }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Entry>> {
        self.by_id.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Entry>)> {
        self.by_id.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Every id of `self` is also in `other`.
    pub fn is_subset(&self, other: &EntryIndex) -> bool {
        self.len() <= other.len() && self.ids().all(|id| other.contains(id))
    }

    /// No id is shared between the two indexes.
    pub fn is_disjoint(&self, other: &EntryIndex) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        !small.ids().any(|id| large.contains(id))
    }
}

/// Identity of an entry: its id exactly as parsed, or a content hash when the id is empty.
fn entry_key(entry: &Entry) -> String {
    if !entry.id.is_empty() {
        return entry.id.clone();
    }

    let input = format!(
        "{}|{}|{}",
        entry.link.as_deref().unwrap_or(""),
        entry.title.as_deref().unwrap_or(""),
        entry
            .updated
            .map(|dt| dt.timestamp().to_string())
            .unwrap_or_default()
    );
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}
