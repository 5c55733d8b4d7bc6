//! Tag Manager for tagmark.
//!
//! Owns tag identity: every name is normalized before lookup or insert, and
//! the `UNIQUE(name)` constraint plus `ON CONFLICT DO NOTHING` keeps two
//! writers from creating the same tag twice.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::types::errors::BookmarkError;
use crate::types::tag::{normalize_tag_name, Tag, TagWithCount};

/// Trait defining tag store operations.
pub trait TagManagerTrait {
    fn resolve_or_create(&self, name: &str) -> Result<Tag, BookmarkError>;
    fn resolve_or_create_batch(&self, names: &[String]) -> Result<Vec<Tag>, BookmarkError>;
    fn get_tag(&self, id: i64) -> Result<Tag, BookmarkError>;
    fn find_by_name(&self, name: &str) -> Result<Option<Tag>, BookmarkError>;
    fn list_all(&self) -> Result<Vec<TagWithCount>, BookmarkError>;
    fn rename(&self, id: i64, new_name: &str) -> Result<Tag, BookmarkError>;
}

/// Tag store backed by a SQLite connection or an open transaction.
pub struct TagManager<'a> {
    conn: &'a Connection,
}

impl<'a> TagManager<'a> {
    /// Creates a new `TagManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
        Ok(Tag {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

impl<'a> TagManagerTrait for TagManager<'a> {
    /// Returns the tag with the normalized form of `name`, inserting it first if needed.
    fn resolve_or_create(&self, name: &str) -> Result<Tag, BookmarkError> {
        let normalized = normalize_tag_name(name);
        if normalized.is_empty() {
            return Err(BookmarkError::Validation("tag name must not be empty".to_string()));
        }

        self.conn.execute(
            "INSERT INTO tag (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![normalized],
        )?;

        let tag = self.conn.query_row(
            "SELECT id, name FROM tag WHERE name = ?1",
            params![normalized],
            Self::row_to_tag,
        )?;
        debug!(tag_id = tag.id, tag = %tag.name, "resolved tag");
        Ok(tag)
    }

    /// Resolves each name in order, skipping blanks and names that normalize
    /// to one already resolved in this batch.
    fn resolve_or_create_batch(&self, names: &[String]) -> Result<Vec<Tag>, BookmarkError> {
        let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
        for name in names {
            if normalize_tag_name(name).is_empty() {
                continue;
            }
            let tag = self.resolve_or_create(name)?;
            if !tags.iter().any(|t| t.id == tag.id) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    fn get_tag(&self, id: i64) -> Result<Tag, BookmarkError> {
        self.conn
            .query_row(
                "SELECT id, name FROM tag WHERE id = ?1",
                params![id],
                Self::row_to_tag,
            )
            .optional()?
            .ok_or_else(|| BookmarkError::NotFound(format!("tag {}", id)))
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Tag>, BookmarkError> {
        let normalized = normalize_tag_name(name);
        let tag = self
            .conn
            .query_row(
                "SELECT id, name FROM tag WHERE name = ?1",
                params![normalized],
                Self::row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    /// Lists every tag referenced by at least one bookmark, by name ascending,
    /// with its usage count taken from the link table.
    fn list_all(&self) -> Result<Vec<TagWithCount>, BookmarkError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, COUNT(bt.bookmark_id) \
             FROM tag t \
             JOIN bookmark_tag bt ON bt.tag_id = t.id \
             GROUP BY t.id, t.name \
             ORDER BY t.name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(TagWithCount {
                id: row.get(0)?,
                name: row.get(1)?,
                bookmark_count: row.get(2)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Renames a tag, storing the normalized form of `new_name`.
    ///
    /// Renaming onto a name held by a different tag is rejected with
    /// `BookmarkError::Conflict`; the two tags are never merged.
    fn rename(&self, id: i64, new_name: &str) -> Result<Tag, BookmarkError> {
        let normalized = normalize_tag_name(new_name);
        if normalized.is_empty() {
            return Err(BookmarkError::Validation("tag name must not be empty".to_string()));
        }

        let current = self.get_tag(id)?;
        if current.name == normalized {
            return Ok(current);
        }

        if let Some(existing) = self.find_by_name(&normalized)? {
            return Err(BookmarkError::Conflict(format!(
                "tag '{}' already exists with id {}",
                existing.name, existing.id
            )));
        }

        self.conn
            .execute(
                "UPDATE tag SET name = ?1 WHERE id = ?2",
                params![normalized, id],
            )
            .map_err(|e| {
                BookmarkError::from_unique_violation(e, format!("tag '{}' already exists", normalized))
            })?;
        debug!(tag_id = id, from = %current.name, to = %normalized, "renamed tag");

        Ok(Tag { id, name: normalized })
    }
}
