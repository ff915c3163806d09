//! Reading and writing generated documentation search indexes.
//!
//! Documentation generators ship a `search_index.js` that assigns a
//! `{"docs": [...]}` object to a global variable for the client-side search
//! box. This crate turns that file (or its plain JSON equivalent) into a
//! [`SearchIndex`] and writes it back out in either layout.

mod reader;
mod writer;

use std::path::Path;

use docindex_shared::{DocIndexError, Result, SearchIndex};
use tracing::{debug, instrument};

pub use writer::DOCUMENTER_VARIABLE;

// ---------------------------------------------------------------------------
// IndexFormat
// ---------------------------------------------------------------------------

/// On-disk layout of a search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// `var documenterSearchIndex = {"docs": [...]}` script.
    DocumenterJs,
    /// Plain pretty-printed `{"docs": [...]}` JSON.
    Json,
}

impl IndexFormat {
    /// Pick a format from a file extension: `.js` is a script, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("js") => Self::DocumenterJs,
            _ => Self::Json,
        }
    }
}

impl std::str::FromStr for IndexFormat {
    type Err = DocIndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "js" | "documenter" => Ok(Self::DocumenterJs),
            "json" => Ok(Self::Json),
            other => Err(DocIndexError::config(format!(
                "unknown index format '{other}': expected 'js' or 'json'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse a search index from a string in any accepted layout.
pub fn parse_index(content: &str) -> Result<SearchIndex> {
    let index = reader::parse_index(content)?;
    debug!(entries = index.len(), "parsed search index");
    Ok(index)
}

/// Read and parse a search index file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_index(path: &Path) -> Result<SearchIndex> {
    let content = std::fs::read_to_string(path).map_err(|e| DocIndexError::io(path, e))?;
    parse_index(&content)
        .map_err(|e| DocIndexError::parse(format!("{}: {e}", path.display())))
}

/// Serialize an index in the given layout.
pub fn render_index(index: &SearchIndex, format: IndexFormat) -> Result<String> {
    match format {
        IndexFormat::DocumenterJs => to_documenter_js(index),
        IndexFormat::Json => writer::to_json(index, true),
    }
}

/// Serialize an index in the Documenter `search_index.js` layout.
pub fn to_documenter_js(index: &SearchIndex) -> Result<String> {
    writer::to_documenter_js(index)
}

/// Serialize an index as JSON.
pub fn to_json(index: &SearchIndex, pretty: bool) -> Result<String> {
    writer::to_json(index, pretty)
}

/// Write an index to `path`, creating parent directories as needed.
#[instrument(skip_all, fields(path = %path.display(), entries = index.len()))]
pub fn write_index(path: &Path, index: &SearchIndex, format: IndexFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DocIndexError::io(parent, e))?;
    }
    let content = render_index(index, format)?;
    std::fs::write(path, content).map_err(|e| DocIndexError::io(path, e))?;
    debug!(?format, "wrote search index");
    Ok(())
}
