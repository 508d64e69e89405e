//! Substring search over catalog resources.
//!
//! # Invariants
//! - Blank keywords return no results; there is no browse-all fallback.
//! - A resource matches iff the lowercased keyword is a substring of its
//!   lowercased label or of any tag.
//! - Categorized matches come first, then legacy matches, each in catalog
//!   order. Duplicates across the two sources are kept.

use crate::catalog::resource_catalog::ResourceCatalog;
use crate::model::resource::Resource;

/// Normalizes a user keyword. Returns `None` for blank input.
pub fn normalize_keyword(keyword: &str) -> Option<String> {
    if keyword.trim().is_empty() {
        return None;
    }
    Some(keyword.to_lowercase())
}

/// Returns catalog resources matching `keyword`.
pub fn search_resources<'a>(catalog: &'a ResourceCatalog, keyword: &str) -> Vec<&'a Resource> {
    let Some(needle) = normalize_keyword(keyword) else {
        return Vec::new();
    };

    let hits = catalog
        .resources()
        .iter()
        .filter(|resource| resource.matches_lowercase(&needle))
        .collect::<Vec<_>>();

    log::debug!(
        "event=resource_search module=search status=ok keyword_chars={} hits={}",
        needle.chars().count(),
        hits.len()
    );
    hits
}
