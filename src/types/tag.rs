use serde::{Deserialize, Serialize};

/// A normalized label shared by many bookmarks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A tag annotated with how many bookmarks currently reference it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagWithCount {
    pub id: i64,
    pub name: String,
    pub bookmark_count: i64,
}

/// Normalizes a tag name: lower-cased, trimmed, internal whitespace runs
/// collapsed to a single space.
///
/// Returns an empty string for blank input.
pub fn normalize_tag_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
