use serde::{Deserialize, Serialize};

use super::tag::Tag;

/// A stored bookmark as returned by queries and the upsert pipeline.
///
/// `tags` is never persisted on the bookmark row; it is joined in from the
/// `bookmark_tag` link table on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    #[serde(rename = "uid")]
    pub owner_id: i64,
    pub public: bool,
    pub image_url: Option<String>,
    pub modified: String,
    #[serde(rename = "tags_detail")]
    pub tags: Vec<Tag>,
    /// Extracted page text, only populated by single-bookmark lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Archived page markup, only populated by single-bookmark lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl Bookmark {
    /// Returns the names of the attached tags, in their current order.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Caller-supplied bookmark data for the create-or-update pipeline.
///
/// `id == None` creates a new bookmark; `Some(id)` updates that bookmark in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookmarkDraft {
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub owner_id: i64,
    pub public: bool,
    pub image_url: Option<String>,
    /// Explicit modification time; "now" is used when absent or blank.
    pub modified: Option<String>,
    pub content: Option<String>,
    pub html: Option<String>,
}

impl BookmarkDraft {
    /// Convenience constructor for a new bookmark with a URL and title.
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Builds an update draft from an existing bookmark.
    pub fn from_bookmark(bookmark: &Bookmark) -> Self {
        Self {
            id: Some(bookmark.id),
            url: bookmark.url.clone(),
            title: bookmark.title.clone(),
            excerpt: bookmark.excerpt.clone(),
            owner_id: bookmark.owner_id,
            public: bookmark.public,
            image_url: bookmark.image_url.clone(),
            modified: None,
            content: bookmark.content.clone(),
            html: bookmark.html.clone(),
        }
    }
}
