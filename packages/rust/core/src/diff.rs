//! Entry-level diff between two generations of an index.
//!
//! Indexes are regenerated wholesale, so the diff only answers which
//! locations appeared, disappeared or changed content between builds.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use docindex_shared::{DocEntry, Location, SearchIndex};

/// Locations grouped by change status, each list in index order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexDiff {
    /// Present only in the new index.
    pub added: Vec<Location>,
    /// Present in both with different page, title, category or text.
    pub changed: Vec<Location>,
    /// Present in both and identical.
    pub unchanged: Vec<Location>,
    /// Present only in the old index.
    pub removed: Vec<Location>,
}

impl IndexDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compare `old` against `new` by location.
///
/// A location duplicated in `old` is matched against its first occurrence;
/// later duplicates are what the integrity check reports.
pub fn diff_indexes(old: &SearchIndex, new: &SearchIndex) -> IndexDiff {
    let mut old_by_location: HashMap<&str, &DocEntry> = HashMap::new();
    for entry in old {
        old_by_location.entry(entry.location.as_str()).or_insert(entry);
    }
    let new_locations: HashSet<&str> = new.iter().map(|e| e.location.as_str()).collect();

    let mut diff = IndexDiff::default();

    for entry in new {
        match old_by_location.get(entry.location.as_str()) {
            Some(&previous) if previous == entry => diff.unchanged.push(entry.location.clone()),
            Some(_) => diff.changed.push(entry.location.clone()),
            None => diff.added.push(entry.location.clone()),
        }
    }

    for entry in old {
        if !new_locations.contains(entry.location.as_str()) {
            diff.removed.push(entry.location.clone());
        }
    }

    diff
}
