//! Serializers for search indexes.
//!
//! The Documenter layout is reproduced exactly so that a canonical file
//! survives a read/write cycle byte for byte.

use docindex_shared::{DocEntry, Result, SearchIndex};

/// Variable name used by the Documenter layout.
pub const DOCUMENTER_VARIABLE: &str = "documenterSearchIndex";

/// Render the index as `var documenterSearchIndex = {"docs": [ ... ]}`.
///
/// ```text
/// var documenterSearchIndex = {"docs": [
///
/// {
///     "location": "index.html#",
///     ...
/// },
///
/// ]}
/// ```
pub(crate) fn to_documenter_js(index: &SearchIndex) -> Result<String> {
    let text_len: usize = index.iter().map(|e| e.text.len() + 128).sum();
    let mut out = String::with_capacity(text_len + 64);

    out.push_str("var ");
    out.push_str(DOCUMENTER_VARIABLE);
    out.push_str(" = {\"docs\": [\n");

    for entry in index {
        out.push('\n');
        write_entry(&mut out, entry)?;
    }

    out.push_str("\n]}\n");
    Ok(out)
}

fn write_entry(out: &mut String, entry: &DocEntry) -> Result<()> {
    let fields = [
        ("location", serde_json::to_string(&entry.location)?),
        ("page", serde_json::to_string(&entry.page)?),
        ("title", serde_json::to_string(&entry.title)?),
        ("category", serde_json::to_string(&entry.category)?),
        ("text", serde_json::to_string(&entry.text)?),
    ];

    out.push_str("{\n");
    for (i, (name, value)) in fields.iter().enumerate() {
        out.push_str("    \"");
        out.push_str(name);
        out.push_str("\": ");
        out.push_str(value);
        if i + 1 < fields.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("},\n");
    Ok(())
}

/// Render the index as a plain `{"docs": [...]}` JSON document.
pub(crate) fn to_json(index: &SearchIndex, pretty: bool) -> Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(index)?
    } else {
        serde_json::to_string(index)?
    };
    json.push('\n');
    Ok(json)
}
