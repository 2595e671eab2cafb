//! Dotted hierarchy identifiers.
//!
//! Element and organization ids are dot-separated paths such as `2.A.c.3.1`.
//! Everything here is a pure function on strings.

use std::collections::BTreeSet;

/// Split an id into its non-empty segments.
fn segments(id: &str) -> Vec<&str> {
    id.split('.').filter(|p| !p.is_empty()).collect()
}

/// All proper prefixes of a dotted id, root first.
///
/// `"2.A.c.3.1"` yields `["2", "2.A", "2.A.c", "2.A.c.3"]`. The id itself and
/// the empty prefix are excluded, so ids with zero or one segment yield
/// nothing. Empty segments are ignored.
pub fn organizations(id: &str) -> Vec<String> {
    let parts = segments(id);
    if parts.len() <= 1 {
        return Vec::new();
    }
    (1..parts.len()).map(|i| parts[..i].join(".")).collect()
}

/// The nearest proper prefix, if any.
pub fn parent_id(id: &str) -> Option<String> {
    organizations(id).pop()
}

/// True when `id` lies strictly below `ancestor` in the hierarchy.
pub fn is_descendant(id: &str, ancestor: &str) -> bool {
    id.len() > ancestor.len() + 1
        && id.starts_with(ancestor)
        && id.as_bytes()[ancestor.len()] == b'.'
}

/// Ids that are not a dot-prefix of any other id in the set.
pub fn leaf_ids<'a, I>(ids: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let all: BTreeSet<&str> = ids.into_iter().collect();
    let mut parents: BTreeSet<String> = BTreeSet::new();
    for id in &all {
        parents.extend(organizations(id));
    }
    all.into_iter()
        .filter(|id| !parents.contains(*id))
        .map(str::to_string)
        .collect()
}
