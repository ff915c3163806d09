//! Absolute links for index locations.

use url::Url;

use docindex_shared::{DocIndexError, Location, Result};

/// Parse the documentation site's base URL, treating it as a directory.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw).map_err(|e| DocIndexError::config(format!("invalid base URL '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(DocIndexError::config(format!(
            "base URL '{raw}' cannot be used to resolve page paths"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolve a relative location against the base URL.
pub fn resolve_location(base: &Url, location: &Location) -> Result<Url> {
    base.join(location.as_str()).map_err(|e| {
        DocIndexError::validation(format!("cannot resolve location '{location}': {e}"))
    })
}
