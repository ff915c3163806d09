//! Fuzzy, relevance-ranked search over a loaded index.
//!
//! Both query and entries are split into lowercase alphanumeric terms.
//! A query term matches an entry term exactly, as a prefix, or (when fuzzy
//! matching is on) within a small edit distance. Title matches are boosted
//! over text matches, and entries that match every query term get a
//! coverage bonus.

use std::collections::HashMap;

use serde::Serialize;
use strsim::osa_distance;
use tracing::{debug, instrument};

use docindex_shared::{Category, Location, SearchIndex, SearchSettings};

/// Weight of an exact term match.
const EXACT_WEIGHT: f64 = 1.0;
/// Weight of a prefix match (`inst` → `installation`).
const PREFIX_WEIGHT: f64 = 0.7;
/// Weight of an edit-distance match (`warmnig` → `warming`).
const FUZZY_WEIGHT: f64 = 0.4;
/// Multiplier for entries matching all terms of a multi-term query.
const COVERAGE_BONUS: f64 = 1.5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Restricts which entries are considered.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Only entries of this category.
    pub category: Option<Category>,
    /// Only entries whose page title equals this (case-insensitive).
    pub page: Option<String>,
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// Zero-based position of the entry in the index.
    pub position: usize,
    pub location: Location,
    pub page: String,
    pub title: String,
    pub category: Category,
    pub score: f64,
    /// Excerpt of the entry text around the first text match.
    pub snippet: String,
    /// Query terms that matched this entry.
    pub matched_terms: Vec<String>,
}

/// Pre-tokenized view of an index, reusable across queries.
pub struct SearchEngine<'a> {
    index: &'a SearchIndex,
    docs: Vec<IndexedEntry>,
}

struct IndexedEntry {
    title_terms: Vec<String>,
    /// Distinct text terms with their counts, in order of first occurrence.
    text_terms: Vec<(String, usize)>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

impl<'a> SearchEngine<'a> {
    /// Tokenize every entry of `index`.
    pub fn new(index: &'a SearchIndex) -> Self {
        let docs = index
            .iter()
            .map(|entry| {
                let mut slots: HashMap<String, usize> = HashMap::new();
                let mut text_terms: Vec<(String, usize)> = Vec::new();
                for term in tokenize(&entry.text) {
                    match slots.get(&term) {
                        Some(&slot) => text_terms[slot].1 += 1,
                        None => {
                            slots.insert(term.clone(), text_terms.len());
                            text_terms.push((term, 1));
                        }
                    }
                }
                IndexedEntry {
                    title_terms: tokenize(&entry.title),
                    text_terms,
                }
            })
            .collect();
        Self { index, docs }
    }

    /// Run a query. Blank queries return no hits.
    #[instrument(skip_all, fields(query = %query))]
    pub fn search(
        &self,
        query: &str,
        settings: &SearchSettings,
        filter: &SearchFilter,
    ) -> Vec<SearchHit> {
        let terms = query_terms(query);
        if terms.is_empty() {
            debug!("blank query");
            return Vec::new();
        }
        let term_lengths: Vec<usize> = terms.iter().map(|t| t.chars().count()).collect();

        let mut hits: Vec<SearchHit> = Vec::new();

        for (position, (entry, doc)) in self.index.iter().zip(&self.docs).enumerate() {
            if let Some(category) = &filter.category {
                if &entry.category != category {
                    continue;
                }
            }
            if let Some(page) = &filter.page {
                if entry.page.to_lowercase() != page.to_lowercase() {
                    continue;
                }
            }

            let mut score = 0.0;
            let mut matched_terms = Vec::new();
            let mut snippet_term: Option<&str> = None;

            for (term, &term_len) in terms.iter().zip(&term_lengths) {
                let title_score = doc
                    .title_terms
                    .iter()
                    .filter_map(|t| match_weight(term, term_len, t, settings.fuzzy))
                    .fold(0.0, f64::max);

                // Ties go to the term that occurs first in the text.
                let mut text_score = 0.0;
                let mut best_text_term: Option<&str> = None;
                for (t, tf) in &doc.text_terms {
                    if let Some(weight) = match_weight(term, term_len, t, settings.fuzzy) {
                        let contribution = weight * (1.0 + (*tf as f64).ln());
                        if contribution > text_score {
                            text_score = contribution;
                            best_text_term = Some(t.as_str());
                        }
                    }
                }

                if title_score > 0.0 || text_score > 0.0 {
                    matched_terms.push(term.clone());
                    score += settings.title_boost * title_score + text_score;
                    if snippet_term.is_none() {
                        snippet_term = best_text_term;
                    }
                }
            }

            if matched_terms.is_empty() {
                continue;
            }
            if terms.len() > 1 && matched_terms.len() == terms.len() {
                score *= COVERAGE_BONUS;
            }

            hits.push(SearchHit {
                position,
                location: entry.location.clone(),
                page: entry.page.clone(),
                title: entry.title.clone(),
                category: entry.category.clone(),
                score,
                snippet: snippet(&entry.text, snippet_term, settings.snippet_width),
                matched_terms,
            });
        }

        // Score first; on ties sections with content beat empty page stubs,
        // then index order.
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| self.is_empty_page(a.position).cmp(&self.is_empty_page(b.position)))
                .then_with(|| a.position.cmp(&b.position))
        });

        if settings.limit > 0 {
            hits.truncate(settings.limit);
        }

        debug!(hits = hits.len(), terms = terms.len(), "search finished");
        hits
    }

    fn is_empty_page(&self, position: usize) -> bool {
        self.index
            .docs
            .get(position)
            .is_some_and(|e| e.is_page() && e.text.trim().is_empty())
    }
}

/// One-shot search without keeping the engine around.
pub fn search(
    index: &SearchIndex,
    query: &str,
    settings: &SearchSettings,
    filter: &SearchFilter,
) -> Vec<SearchHit> {
    SearchEngine::new(index).search(query, settings, filter)
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// Split into lowercase runs of alphanumeric characters (Unicode aware).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Deduplicated query terms; single characters are dropped unless nothing else is left.
fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in tokenize(query) {
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    if terms.iter().any(|t| t.chars().count() >= 2) {
        terms.retain(|t| t.chars().count() >= 2);
    }
    terms
}

/// Edits allowed for a query term of `len` characters.
fn max_edits(len: usize) -> usize {
    match len {
        0..=3 => 0,
        4..=7 => 1,
        _ => 2,
    }
}

/// Exact, prefix, or (optionally) edit-distance match of `term` against an entry term.
///
/// The edit distance is optimal string alignment, so a swapped pair of
/// adjacent letters counts as one edit.
fn match_weight(term: &str, term_len: usize, candidate: &str, fuzzy: bool) -> Option<f64> {
    if candidate == term {
        return Some(EXACT_WEIGHT);
    }
    if term_len >= 2 && candidate.starts_with(term) {
        return Some(PREFIX_WEIGHT);
    }
    if !fuzzy {
        return None;
    }
    let allowed = max_edits(term_len);
    if allowed == 0 || candidate.chars().count().abs_diff(term_len) > allowed {
        return None;
    }
    (osa_distance(term, candidate) <= allowed).then_some(FUZZY_WEIGHT)
}

// ---------------------------------------------------------------------------
// Snippets
// ---------------------------------------------------------------------------

/// A `width`-character window of `text` around the first occurrence of `term`.
fn snippet(text: &str, term: Option<&str>, width: usize) -> String {
    let flat: Vec<char> = text.split_whitespace().collect::<Vec<_>>().join(" ").chars().collect();
    if flat.is_empty() || width == 0 {
        return String::new();
    }

    let at = term.and_then(|term| term_offset(&flat, term)).unwrap_or(0);

    let mut start = at.saturating_sub(width / 4);
    let end = (start + width).min(flat.len());
    if end - start < width {
        start = end.saturating_sub(width);
    }

    let mut out = String::new();
    if start > 0 {
        out.push('…');
    }
    out.extend(&flat[start..end]);
    if end < flat.len() {
        out.push('…');
    }
    out
}

/// Char offset of the first alphanumeric run that tokenizes to `term`.
fn term_offset(flat: &[char], term: &str) -> Option<usize> {
    let mut run_start: Option<usize> = None;
    for (i, c) in flat.iter().copied().chain(std::iter::once(' ')).enumerate() {
        if c.is_alphanumeric() {
            run_start.get_or_insert(i);
        } else if let Some(start) = run_start.take() {
            let run: String = flat[start..i].iter().collect();
            if run.to_lowercase() == term {
                return Some(start);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use docindex_shared::DocEntry;

    use super::*;

    fn reference() -> SearchIndex {
        docindex_parser::read_index(Path::new(
            "../../../fixtures/documenter/constrained-lasso.search_index.js",
        ))
        .unwrap()
    }

    fn settings() -> SearchSettings {
        SearchSettings::default()
    }

    #[test]
    fn tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("βpath, ρpath, = lsq_classopath(X, y);"),
            vec!["βpath", "ρpath", "lsq", "classopath", "x", "y"]
        );
        assert!(tokenize("  -- ").is_empty());
    }

    #[test]
    fn query_terms_drop_single_chars() {
        assert_eq!(query_terms("X y lasso Lasso"), vec!["lasso"]);
        assert_eq!(query_terms("X y"), vec!["x", "y"]);
    }

    #[test]
    fn match_weight_scales_edits_with_term_length() {
        let w = |term: &str, candidate: &str| {
            match_weight(term, term.chars().count(), candidate, true)
        };
        assert_eq!(w("lasso", "lasso"), Some(EXACT_WEIGHT));
        assert_eq!(w("inst", "installation"), Some(PREFIX_WEIGHT));
        // one adjacent swap is a single edit
        assert_eq!(w("warmnig", "warming"), Some(FUZZY_WEIGHT));
        assert_eq!(w("tumor", "tumour"), Some(FUZZY_WEIGHT));
        // short terms never match fuzzily
        assert_eq!(w("rho", "rhp"), None);
        // two edits need a term of at least eight characters
        assert_eq!(w("lasso", "lssao"), None);
        assert_eq!(w("classopath", "clasopaht"), Some(FUZZY_WEIGHT));
        assert_eq!(match_weight("warmnig", 7, "warming", false), None);
    }

    #[test]
    fn title_match_ranks_first() {
        let index = reference();
        let hits = search(&index, "install", &settings(), &SearchFilter::default());
        assert!(!hits.is_empty());
        assert_eq!(hits[0].location.as_str(), "index.html#Installation-1");
        assert!(hits[0].snippet.contains("install"));
    }

    #[test]
    fn typo_still_finds_page() {
        let index = reference();
        let hits = search(&index, "warmnig", &settings(), &SearchFilter::default());
        assert!(!hits.is_empty());
        assert_eq!(hits[0].page, "Global Warming Data");
        // the section stub outranks the empty page entry on a tie
        assert_eq!(hits[0].location.as_str(), "demo/warming.html#Global-Warming-Data-1");
    }

    #[test]
    fn truncated_and_misspelled_page_terms() {
        let index = reference();
        for query in ["prostat", "prostte"] {
            let hits = search(&index, query, &settings(), &SearchFilter::default());
            assert!(!hits.is_empty(), "no hits for {query}");
            assert_eq!(hits[0].page, "Example");
            assert_eq!(hits[0].location.page_path(), "demo/prostate.html");
            assert!(hits[0].snippet.contains("prostate"));
        }

        // the exact prefix outscores the one-edit match
        let prefix = search(&index, "prostat", &settings(), &SearchFilter::default());
        let typo = search(&index, "prostte", &settings(), &SearchFilter::default());
        assert!(prefix[0].score > typo[0].score);
    }

    #[test]
    fn snippets_are_stable_across_engines() {
        let index = reference();
        let snippets: Vec<String> = (0..32)
            .map(|_| {
                let hits = SearchEngine::new(&index).search(
                    "coef",
                    &settings(),
                    &SearchFilter::default(),
                );
                hits.into_iter()
                    .find(|h| h.location.as_str() == "demo/microbiome.html#Section-6.3-1")
                    .expect("microbiome hit")
                    .snippet
            })
            .collect();

        assert!(snippets.iter().all(|s| s == &snippets[0]));
        // "coefficient" and the misspelled "coeffcient" tie; the earlier one wins
        assert!(snippets[0].contains("plots the coefficient estimate solution paths"));
    }

    #[test]
    fn fuzzy_can_be_disabled() {
        let index = reference();
        let mut strict = settings();
        strict.fuzzy = false;
        assert!(search(&index, "warmnig", &strict, &SearchFilter::default()).is_empty());
    }

    #[test]
    fn multi_term_query_prefers_full_coverage() {
        let index = reference();
        let hits = search(&index, "lsq_classopath", &settings(), &SearchFilter::default());
        assert!(!hits.is_empty());
        for hit in &hits {
            assert_eq!(hit.matched_terms, vec!["lsq", "classopath"]);
            assert_eq!(hit.category, Category::Section);
        }
        assert!(hits[0].snippet.contains("lsq_classopath"));
    }

    #[test]
    fn blank_query_returns_nothing() {
        let index = reference();
        assert!(search(&index, "   ", &settings(), &SearchFilter::default()).is_empty());
        assert!(search(&index, "--", &settings(), &SearchFilter::default()).is_empty());
    }

    #[test]
    fn category_and_page_filters() {
        let index = reference();
        let pages_only = SearchFilter {
            category: Some(Category::Page),
            page: None,
        };
        let hits = search(&index, "data", &settings(), &pages_only);
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.category == Category::Page));

        let tumor_only = SearchFilter {
            category: None,
            page: Some("brain tumor data".into()),
        };
        let hits = search(&index, "data", &settings(), &tumor_only);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.page == "Brain Tumor Data"));
    }

    #[test]
    fn limit_truncates() {
        let index = reference();
        let mut limited = settings();
        limited.limit = 2;
        let hits = search(&index, "lasso", &limited, &SearchFilter::default());
        assert_eq!(hits.len(), 2);

        limited.limit = 0;
        let all = search(&index, "lasso", &limited, &SearchFilter::default());
        assert!(all.len() > 2);
    }

    #[test]
    fn ties_keep_index_order() {
        let entry = |location: &str| DocEntry {
            location: location.into(),
            page: "P".into(),
            title: "Solver".into(),
            category: Category::Section,
            text: String::new(),
        };
        let index = SearchIndex::new(vec![entry("p.html#A-1"), entry("p.html#B-1")]);
        let hits = search(&index, "solver", &settings(), &SearchFilter::default());
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 1);
    }

    #[test]
    fn snippet_windows_and_ellipsis() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        assert_eq!(snippet(text, Some("delta"), 1000), text);

        let s = snippet(text, Some("theta"), 12);
        assert!(s.starts_with('…'));
        assert!(s.ends_with("theta"));
        assert_eq!(s.chars().count(), 13);

        let s = snippet(text, None, 5);
        assert_eq!(s, "alpha…");

        assert_eq!(snippet("", Some("x"), 10), "");
    }

    #[test]
    fn snippet_collapses_newlines() {
        let s = snippet("using ConstrainedLasso\nusing DataFrames", Some("dataframes"), 100);
        assert_eq!(s, "using ConstrainedLasso using DataFrames");
    }

    #[test]
    fn snippet_finds_terms_with_special_lowercasing() {
        let sigma = tokenize("ΟΔΟΣ").remove(0);
        let s = snippet("aaaa bbbb ΟΔΟΣ", Some(&sigma), 8);
        assert_eq!(s, "…bbb ΟΔΟΣ");

        let dotted = tokenize("İstanbul").remove(0);
        let s = snippet("xxxx yyyy İstanbul", Some(&dotted), 10);
        assert_eq!(s, "…y İstanbul");
    }
}
