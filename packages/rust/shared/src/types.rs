//! Core domain types for documentation search indexes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Distinguishes whole-page entries from in-page section entries.
///
/// Unrecognized values are kept verbatim in [`Category::Other`] so that a
/// malformed index still loads and the integrity check can point at the
/// offending entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// The entry describes a whole page.
    Page,
    /// The entry describes a section within a page.
    Section,
    /// Any other category string found in the input.
    Other(String),
}

impl Category {
    /// The string form used in the index file.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Page => "page",
            Self::Section => "section",
            Self::Other(raw) => raw,
        }
    }

    /// Whether this is one of the two recognized categories.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "page" => Self::Page,
            "section" => Self::Section,
            _ => Self::Other(raw),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A page path plus fragment, e.g. `demo/prostate.html#Example-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(pub String);

impl Location {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The page part, everything before the first `#`.
    pub fn page_path(&self) -> &str {
        match self.0.split_once('#') {
            Some((path, _)) => path,
            None => &self.0,
        }
    }

    /// The fragment after `#`; empty for whole-page locations.
    pub fn anchor(&self) -> &str {
        match self.0.split_once('#') {
            Some((_, anchor)) => anchor,
            None => "",
        }
    }

    /// Whether the location carries a `#` separator at all.
    pub fn has_fragment(&self) -> bool {
        self.0.contains('#')
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Location {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

// ---------------------------------------------------------------------------
// DocEntry
// ---------------------------------------------------------------------------

/// A single record of the search index.
///
/// Field order matches the generated file and is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    /// Page path and anchor, unique per index.
    pub location: Location,
    /// Human-readable page title.
    pub page: String,
    /// Human-readable section title.
    pub title: String,
    /// Whole page or in-page section.
    pub category: Category,
    /// Rendered text used for full-text search.
    pub text: String,
}

impl DocEntry {
    pub fn is_page(&self) -> bool {
        self.category == Category::Page
    }

    pub fn is_section(&self) -> bool {
        self.category == Category::Section
    }
}

// ---------------------------------------------------------------------------
// SearchIndex
// ---------------------------------------------------------------------------

/// An ordered list of entries; order mirrors the page/section hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndex {
    pub docs: Vec<DocEntry>,
}

impl SearchIndex {
    pub fn new(docs: Vec<DocEntry>) -> Self {
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn entries(&self) -> &[DocEntry] {
        &self.docs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocEntry> {
        self.docs.iter()
    }

    /// Look up an entry by its exact location.
    pub fn find(&self, location: &str) -> Option<&DocEntry> {
        self.docs.iter().find(|e| e.location.as_str() == location)
    }

    /// All whole-page entries, in index order.
    pub fn pages(&self) -> impl Iterator<Item = &DocEntry> {
        self.docs.iter().filter(|e| e.is_page())
    }
}

impl<'a> IntoIterator for &'a SearchIndex {
    type Item = &'a DocEntry;
    type IntoIter = std::slice::Iter<'a, DocEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(location: &str, page: &str, title: &str, category: &str) -> DocEntry {
        DocEntry {
            location: location.into(),
            page: page.into(),
            title: title.into(),
            category: Category::from(category.to_string()),
            text: String::new(),
        }
    }

    #[test]
    fn location_splits_path_and_anchor() {
        let loc = Location::from("demo/prostate.html#Unconstrained-lasso-1");
        assert_eq!(loc.page_path(), "demo/prostate.html");
        assert_eq!(loc.anchor(), "Unconstrained-lasso-1");

        let page = Location::from("index.html#");
        assert_eq!(page.page_path(), "index.html");
        assert_eq!(page.anchor(), "");
        assert!(page.has_fragment());

        let bare = Location::from("index.html");
        assert_eq!(bare.page_path(), "index.html");
        assert!(!bare.has_fragment());
    }

    #[test]
    fn category_serializes_as_lowercase_string() {
        let json = serde_json::to_string(&Category::Section).expect("serialize");
        assert_eq!(json, "\"section\"");

        let parsed: Category = serde_json::from_str("\"page\"").expect("deserialize");
        assert_eq!(parsed, Category::Page);
    }

    #[test]
    fn unknown_category_is_preserved() {
        let parsed: Category = serde_json::from_str("\"chapter\"").expect("deserialize");
        assert_eq!(parsed, Category::Other("chapter".into()));
        assert!(!parsed.is_recognized());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"chapter\"");
    }

    #[test]
    fn entry_field_order_is_stable() {
        let e = entry("index.html#", "Home", "Home", "page");
        let json = serde_json::to_string(&e).expect("serialize");
        assert_eq!(
            json,
            r#"{"location":"index.html#","page":"Home","title":"Home","category":"page","text":""}"#
        );
    }

    #[test]
    fn index_lookup_and_pages() {
        let index = SearchIndex::new(vec![
            entry("index.html#", "Home", "Home", "page"),
            entry("index.html#Installation-1", "Home", "Installation", "section"),
            entry("demo/tumor.html#", "Brain Tumor Data", "Brain Tumor Data", "page"),
        ]);

        assert_eq!(index.len(), 3);
        assert_eq!(
            index.find("index.html#Installation-1").map(|e| e.title.as_str()),
            Some("Installation")
        );
        assert!(index.find("missing.html#").is_none());
        assert_eq!(index.pages().count(), 2);
    }
}
