//! Lenient reader for generated search index files.
//!
//! Accepted shapes:
//! - `var documenterSearchIndex = {"docs": [ ... ]}` (optional trailing `;`)
//! - `{"docs": [ ... ]}`
//! - `[ ... ]`
//!
//! Generators emit a trailing comma after the last entry and may leave raw
//! control characters (tabs) inside string literals. Both are repaired
//! before the body is handed to `serde_json`.

use std::sync::LazyLock;

use docindex_shared::{DocEntry, DocIndexError, Result, SearchIndex};
use regex::Regex;
use tracing::debug;

/// Matches a JavaScript variable assignment prefix: `var name = `.
static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:var|let|const)\s+([A-Za-z_$][\w$]*)\s*=\s*").expect("assignment regex")
});

/// Parse the contents of a search index file.
pub(crate) fn parse_index(content: &str) -> Result<SearchIndex> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Err(DocIndexError::parse("search index is empty"));
    }

    let body = match ASSIGN_RE.captures(content) {
        Some(caps) => {
            debug!(variable = &caps[1], "stripping script assignment");
            &content[caps[0].len()..]
        }
        None => content,
    };
    let body = body.trim_end();
    let body = body.strip_suffix(';').unwrap_or(body).trim();

    let repaired = repair_json(body)?;

    match repaired.as_bytes().first() {
        Some(b'{') => serde_json::from_str::<SearchIndex>(&repaired)
            .map_err(|e| DocIndexError::parse(format!("invalid search index object: {e}"))),
        Some(b'[') => serde_json::from_str::<Vec<DocEntry>>(&repaired)
            .map(SearchIndex::new)
            .map_err(|e| DocIndexError::parse(format!("invalid search index array: {e}"))),
        _ => Err(DocIndexError::parse(
            "unrecognized search index: expected `var <name> = {...}`, an object, or an array",
        )),
    }
}

/// Drop trailing commas and escape raw control characters inside strings.
///
/// Works on bytes: every structural character is ASCII, and multi-byte
/// UTF-8 sequences never contain bytes below 0x80, so they pass through.
fn repair_json(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if in_string {
            if escaped {
                escaped = false;
                out.push(b);
            } else if b == b'\\' {
                escaped = true;
                out.push(b);
            } else if b == b'"' {
                in_string = false;
                out.push(b);
            } else if b < 0x20 {
                push_control_escape(&mut out, b);
            } else {
                out.push(b);
            }
            i += 1;
            continue;
        }

        match b {
            b'"' => {
                in_string = true;
                out.push(b);
            }
            b',' => {
                let next = bytes[i + 1..]
                    .iter()
                    .copied()
                    .find(|c| !c.is_ascii_whitespace());
                if !matches!(next, Some(b']') | Some(b'}')) {
                    out.push(b);
                }
            }
            _ => out.push(b),
        }
        i += 1;
    }

    if in_string {
        return Err(DocIndexError::parse("unterminated string literal"));
    }

    String::from_utf8(out).map_err(|e| DocIndexError::parse(format!("invalid UTF-8: {e}")))
}

fn push_control_escape(out: &mut Vec<u8>, b: u8) {
    match b {
        b'\n' => out.extend_from_slice(b"\\n"),
        b'\r' => out.extend_from_slice(b"\\r"),
        b'\t' => out.extend_from_slice(b"\\t"),
        _ => out.extend_from_slice(format!("\\u{b:04x}").as_bytes()),
    }
}
