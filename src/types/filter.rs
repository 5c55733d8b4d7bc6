//! Bookmark search filters.
//!
//! A [`BookmarkFilter`] is what callers build; [`BookmarkFilter::resolve`]
//! validates it and turns it into a [`ResolvedFilter`] in which the wildcard
//! tokens have been detected and tag names normalized. Both the list query and
//! the count query are built from the same resolved filter.

use serde::{Deserialize, Serialize};

use super::errors::BookmarkError;
use super::tag::normalize_tag_name;

/// Tag token meaning "any tag at all".
pub const TAG_WILDCARD: &str = "*";

/// Result ordering for bookmark searches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderMethod {
    /// Oldest to newest (identity ascending).
    #[default]
    Default,
    /// Newest addition first (identity descending).
    LastAdded,
    /// Latest modification first.
    LastModified,
}

/// Caller-facing search filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BookmarkFilter {
    /// Case-insensitive substring matched against URL or excerpt.
    pub keyword: String,
    /// Every listed tag must be present. `"*"` means "has at least one tag".
    pub include_tags: Vec<String>,
    /// None of the listed tags may be present. `"*"` means "has no tags".
    pub exclude_tags: Vec<String>,
    /// Explicit id allow-list; empty means no id restriction.
    pub ids: Vec<i64>,
    pub order: OrderMethod,
    /// Page size; `<= 0` disables pagination entirely.
    pub limit: i64,
    pub offset: i64,
}

impl BookmarkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: &str) -> Self {
        self.keyword = keyword.to_string();
        self
    }

    pub fn include_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.include_tags = tags.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    pub fn exclude_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.exclude_tags = tags.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    pub fn ids(mut self, ids: &[i64]) -> Self {
        self.ids = ids.to_vec();
        self
    }

    pub fn order(mut self, order: OrderMethod) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Returns a copy of this filter with pagination disabled.
    pub fn without_limit(&self) -> Self {
        Self {
            limit: 0,
            offset: 0,
            ..self.clone()
        }
    }

    /// Validates the filter and resolves wildcards and tag normalization.
    ///
    /// # Errors
    /// Returns `BookmarkError::InvalidFilter` for non-positive ids or a negative
    /// offset combined with an active limit.
    pub fn resolve(&self) -> Result<ResolvedFilter, BookmarkError> {
        if let Some(bad) = self.ids.iter().find(|id| **id <= 0) {
            return Err(BookmarkError::InvalidFilter(format!(
                "bookmark id must be positive, got {}",
                bad
            )));
        }

        let pagination = if self.limit > 0 {
            if self.offset < 0 {
                return Err(BookmarkError::InvalidFilter(format!(
                    "offset must not be negative, got {}",
                    self.offset
                )));
            }
            Some((self.limit, self.offset))
        } else {
            None
        };

        let exclude_all = self.exclude_tags.iter().any(|t| t.trim() == TAG_WILDCARD);
        let include_all = self.include_tags.iter().any(|t| t.trim() == TAG_WILDCARD);

        let include_tags = if include_all {
            Vec::new()
        } else {
            normalize_tag_list(&self.include_tags)
        };
        let exclude_tags = if exclude_all {
            Vec::new()
        } else {
            normalize_tag_list(&self.exclude_tags)
        };

        let keyword = self.keyword.trim();

        let mut ids = self.ids.clone();
        ids.sort_unstable();
        ids.dedup();

        Ok(ResolvedFilter {
            keyword: (!keyword.is_empty()).then(|| keyword.to_string()),
            ids,
            scope: if exclude_all {
                TagScope::Untagged
            } else if include_all {
                TagScope::Tagged
            } else {
                TagScope::Any
            },
            include_tags,
            exclude_tags,
            order: self.order,
            pagination,
        })
    }
}

/// Wildcard outcome of a filter.
///
/// The two wildcards are mutually exclusive branches: exclude-all is checked
/// first, so requesting both yields `Untagged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagScope {
    Any,
    /// Only bookmarks with zero tags.
    Untagged,
    /// Only bookmarks with at least one tag.
    Tagged,
}

/// A validated filter, ready to be rendered into SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub keyword: Option<String>,
    pub ids: Vec<i64>,
    pub scope: TagScope,
    /// Normalized, deduplicated; AND semantics.
    pub include_tags: Vec<String>,
    /// Normalized, deduplicated; OR semantics.
    pub exclude_tags: Vec<String>,
    pub order: OrderMethod,
    /// `(limit, offset)` when pagination is active.
    pub pagination: Option<(i64, i64)>,
}

fn normalize_tag_list(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let name = normalize_tag_name(tag);
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
