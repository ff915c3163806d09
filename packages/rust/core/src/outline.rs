//! Page/section outline implied by entry order.
//!
//! Entries are grouped by the page path of their location, pages in order
//! of first appearance, sections in index order.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;
use tracing::{debug, instrument};

use docindex_shared::{Category, Location, SearchIndex};

/// All pages of an index with their sections.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outline {
    pub pages: Vec<OutlinePage>,
}

/// One documentation page.
#[derive(Debug, Clone, Serialize)]
pub struct OutlinePage {
    /// Page path, e.g. `demo/prostate.html`.
    pub path: String,
    /// Page title.
    pub title: String,
    /// Location of the whole-page entry, if the index has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub sections: Vec<OutlineSection>,
}

/// A section heading within a page.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineSection {
    pub title: String,
    pub location: Location,
}

/// Group entries into pages and sections.
#[instrument(skip_all, fields(entries = index.len()))]
pub fn build_outline(index: &SearchIndex) -> Outline {
    let mut pages: Vec<OutlinePage> = Vec::new();
    let mut by_path: HashMap<String, usize> = HashMap::new();

    for entry in index {
        let path = entry.location.page_path();
        let slot = *by_path.entry(path.to_string()).or_insert_with(|| {
            pages.push(OutlinePage {
                path: path.to_string(),
                title: entry.page.clone(),
                location: None,
                sections: Vec::new(),
            });
            pages.len() - 1
        });
        let page = &mut pages[slot];

        match &entry.category {
            Category::Page => {
                page.title = entry.page.clone();
                page.location = Some(entry.location.clone());
            }
            Category::Section => page.sections.push(OutlineSection {
                title: entry.title.clone(),
                location: entry.location.clone(),
            }),
            Category::Other(raw) => {
                debug!(location = %entry.location, category = %raw, "skipping entry");
            }
        }
    }

    Outline { pages }
}

impl Outline {
    /// Number of section entries across all pages.
    pub fn section_count(&self) -> usize {
        self.pages.iter().map(|p| p.sections.len()).sum()
    }

    /// Indented plain-text rendering for terminals.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            let _ = writeln!(out, "{} ({})", page.title, page.path);
            for section in &page.sections {
                let _ = writeln!(
                    out,
                    "  - {}  #{}",
                    section.title,
                    section.location.anchor()
                );
            }
        }
        out
    }
}
