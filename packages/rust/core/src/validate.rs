//! Integrity checks for search indexes.
//!
//! Errors break the contract the search front end relies on (unique
//! locations, known categories, page entries titled after their page).
//! Warnings flag shapes the generator never produces but that still load.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, instrument};

use docindex_shared::{Category, DocIndexError, Location, Result, SearchIndex};

// ---------------------------------------------------------------------------
// Issue model
// ---------------------------------------------------------------------------

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// What went wrong with an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// Another entry earlier in the index has the same location.
    DuplicateLocation { first_position: usize },
    /// Category is neither `page` nor `section`.
    UnknownCategory { category: String },
    /// A page entry whose title is not the page title.
    PageTitleMismatch { page: String, title: String },
    /// A page entry pointing at an in-page anchor.
    PageWithAnchor { anchor: String },
    /// A location without a `#` separator.
    MissingFragment,
    /// A section whose page title disagrees with its page entry.
    SectionPageMismatch { expected: String, found: String },
    /// Sections exist for a page path that has no page entry.
    MissingPageEntry { page_path: String },
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateLocation { first_position } => {
                write!(f, "duplicate location (first seen at entry {first_position})")
            }
            Self::UnknownCategory { category } => {
                write!(f, "unknown category '{category}' (expected 'page' or 'section')")
            }
            Self::PageTitleMismatch { page, title } => {
                write!(f, "page entry title '{title}' differs from page '{page}'")
            }
            Self::PageWithAnchor { anchor } => {
                write!(f, "page entry has anchor '#{anchor}'")
            }
            Self::MissingFragment => write!(f, "location has no '#' fragment separator"),
            Self::SectionPageMismatch { expected, found } => {
                write!(f, "section page '{found}' differs from page entry '{expected}'")
            }
            Self::MissingPageEntry { page_path } => {
                write!(f, "no page entry for '{page_path}'")
            }
        }
    }
}

/// A single finding, anchored to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    /// Zero-based position of the entry in the index.
    pub position: usize,
    pub location: Location,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{level}: entry {} ({}): {}",
            self.position, self.location, self.kind
        )
    }
}

/// All findings for one index, in entry order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub entries: usize,
    pub issues: Vec<Issue>,
}

impl CheckReport {
    /// True when no error-severity issue was found.
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }

    /// True when there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Turn error-severity issues into a [`DocIndexError::Validation`].
    pub fn into_result(self) -> Result<()> {
        let errors: Vec<String> = self.errors().map(ToString::to_string).collect();
        if errors.is_empty() {
            return Ok(());
        }
        Err(DocIndexError::validation(format!(
            "{} problem(s) found:\n{}",
            errors.len(),
            errors.join("\n")
        )))
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Run every integrity check over the index.
#[instrument(skip_all, fields(entries = index.len()))]
pub fn check_index(index: &SearchIndex) -> CheckReport {
    let mut issues = Vec::new();

    // page_path -> page title, from page entries
    let page_titles: HashMap<&str, &str> = index
        .pages()
        .map(|e| (e.location.page_path(), e.page.as_str()))
        .collect();

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut orphan_paths: HashSet<&str> = HashSet::new();

    for (position, entry) in index.iter().enumerate() {
        let mut push = |severity, kind| {
            issues.push(Issue {
                severity,
                position,
                location: entry.location.clone(),
                kind,
            })
        };

        if let Some(&first_position) = seen.get(entry.location.as_str()) {
            push(Severity::Error, IssueKind::DuplicateLocation { first_position });
        } else {
            seen.insert(entry.location.as_str(), position);
        }

        if !entry.location.has_fragment() {
            push(Severity::Warning, IssueKind::MissingFragment);
        }

        match &entry.category {
            Category::Page => {
                if entry.title != entry.page {
                    push(
                        Severity::Error,
                        IssueKind::PageTitleMismatch {
                            page: entry.page.clone(),
                            title: entry.title.clone(),
                        },
                    );
                }
                if !entry.location.anchor().is_empty() {
                    push(
                        Severity::Warning,
                        IssueKind::PageWithAnchor {
                            anchor: entry.location.anchor().to_string(),
                        },
                    );
                }
            }
            Category::Section => {
                let path = entry.location.page_path();
                match page_titles.get(path) {
                    Some(&expected) if expected != entry.page => push(
                        Severity::Warning,
                        IssueKind::SectionPageMismatch {
                            expected: expected.to_string(),
                            found: entry.page.clone(),
                        },
                    ),
                    Some(_) => {}
                    None => {
                        if orphan_paths.insert(path) {
                            push(
                                Severity::Warning,
                                IssueKind::MissingPageEntry {
                                    page_path: path.to_string(),
                                },
                            );
                        }
                    }
                }
            }
            Category::Other(raw) => push(
                Severity::Error,
                IssueKind::UnknownCategory {
                    category: raw.clone(),
                },
            ),
        }
    }

    debug!(issues = issues.len(), "integrity check finished");

    CheckReport {
        entries: index.len(),
        issues,
    }
}

/// Serialize in the Documenter layout, parse again and compare entry by entry.
#[instrument(skip_all, fields(entries = index.len()))]
pub fn check_round_trip(index: &SearchIndex) -> Result<()> {
    let rendered = docindex_parser::to_documenter_js(index)?;
    let reparsed = docindex_parser::parse_index(&rendered)?;

    if reparsed.len() != index.len() {
        return Err(DocIndexError::validation(format!(
            "round trip changed entry count: {} -> {}",
            index.len(),
            reparsed.len()
        )));
    }

    for (position, (before, after)) in index.iter().zip(reparsed.iter()).enumerate() {
        if before != after {
            return Err(DocIndexError::validation(format!(
                "round trip changed entry {position} ({})",
                before.location
            )));
        }
    }
    Ok(())
}
