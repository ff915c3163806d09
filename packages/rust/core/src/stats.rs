//! Summary numbers and a content fingerprint for an index.

use std::collections::HashSet;

use serde::Serialize;
use sha2::{Digest, Sha256};

use docindex_shared::{Category, Result, SearchIndex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub pages: usize,
    pub sections: usize,
    /// Entries with an unrecognized category.
    pub other: usize,
    /// Distinct page paths referenced by locations.
    pub page_paths: usize,
    pub empty_text: usize,
    /// Total text length in characters.
    pub total_text_chars: usize,
    /// SHA-256 of the canonical Documenter serialization, hex encoded.
    pub fingerprint: String,
}

pub fn index_stats(index: &SearchIndex) -> Result<IndexStats> {
    let mut stats = IndexStats {
        entries: index.len(),
        pages: 0,
        sections: 0,
        other: 0,
        page_paths: 0,
        empty_text: 0,
        total_text_chars: 0,
        fingerprint: fingerprint(index)?,
    };

    let mut paths: HashSet<&str> = HashSet::new();
    for entry in index {
        match entry.category {
            Category::Page => stats.pages += 1,
            Category::Section => stats.sections += 1,
            Category::Other(_) => stats.other += 1,
        }
        if entry.text.is_empty() {
            stats.empty_text += 1;
        }
        stats.total_text_chars += entry.text.chars().count();
        paths.insert(entry.location.page_path());
    }
    stats.page_paths = paths.len();

    Ok(stats)
}

/// Hash of the canonical serialization; equal for indexes with equal entries.
pub fn fingerprint(index: &SearchIndex) -> Result<String> {
    let rendered = docindex_parser::to_documenter_js(index)?;
    let mut hasher = Sha256::new();
    hasher.update(rendered.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
