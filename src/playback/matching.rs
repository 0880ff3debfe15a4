//! Loose target-id matching.
//!
//! Events, elements, grid cells and chat messages name their entities inconsistently across
//! source shapes (`officer`, `officer_main`, `Officer`). Association is therefore
//! case-insensitive substring containment in either direction.

/// `true` when either id contains the other, ignoring case.
///
/// Empty ids never match.
pub fn target_matches(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// One-directional variant: `haystack` contains `needle`, ignoring case.
///
/// Grid-cell lookups only check that the cell's entity id contains the event target.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    !haystack.is_empty()
        && !needle.is_empty()
        && haystack.to_lowercase().contains(&needle.to_lowercase())
}
