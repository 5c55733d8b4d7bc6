//! Bookmark Manager for tagmark.
//!
//! The read side is the filtered, paginated search engine (`search`, `count`,
//! single lookups). The write side holds the row-level statements the upsert
//! pipeline composes inside its transaction.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

use super::bookmark_query::{render_count, render_search, BOOKMARK_COLUMNS};
use super::link_manager::{LinkManager, LinkManagerTrait};
use crate::types::bookmark::{Bookmark, BookmarkDraft};
use crate::types::errors::BookmarkError;
use crate::types::filter::BookmarkFilter;

/// Trait defining bookmark query and row operations.
pub trait BookmarkManagerTrait {
    /// Paginated search. Returns (bookmarks, total_count) where the count ignores pagination.
    fn search(&self, filter: &BookmarkFilter) -> Result<(Vec<Bookmark>, i64), BookmarkError>;
    fn list(&self, filter: &BookmarkFilter) -> Result<Vec<Bookmark>, BookmarkError>;
    fn count(&self, filter: &BookmarkFilter) -> Result<i64, BookmarkError>;
    fn get(&self, id: i64) -> Result<Bookmark, BookmarkError>;
    fn get_by_url(&self, url: &str) -> Result<Option<Bookmark>, BookmarkError>;
    fn insert_row(&self, draft: &BookmarkDraft, modified: &str) -> Result<i64, BookmarkError>;
    fn update_row(&self, id: i64, draft: &BookmarkDraft, modified: &str) -> Result<(), BookmarkError>;
    fn upsert_content(&self, id: i64, title: &str, content: Option<&str>, html: Option<&str>) -> Result<(), BookmarkError>;
    fn delete_row(&self, id: i64) -> Result<(), BookmarkError>;
}

/// Bookmark manager backed by a SQLite connection or an open transaction.
pub struct BookmarkManager<'a> {
    conn: &'a Connection,
}

impl<'a> BookmarkManager<'a> {
    /// Creates a new `BookmarkManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Reads a bookmark row laid out as `BOOKMARK_COLUMNS`; tags are left empty.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            excerpt: row.get(3)?,
            owner_id: row.get(4)?,
            public: row.get(5)?,
            image_url: row.get(6)?,
            modified: row.get(7)?,
            tags: Vec::new(),
            content: None,
            html: None,
        })
    }

    /// Fills `tags` on every bookmark with one batched lookup.
    fn enrich(&self, bookmarks: &mut [Bookmark]) -> Result<(), BookmarkError> {
        if bookmarks.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = bookmarks.iter().map(|b| b.id).collect();
        let mut tags = LinkManager::new(self.conn).tags_for_bookmarks(&ids)?;
        for bookmark in bookmarks.iter_mut() {
            bookmark.tags = tags.remove(&bookmark.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Looks up one bookmark with its content record and tags.
    fn find_one<P: rusqlite::ToSql>(&self, predicate: &str, value: P) -> Result<Option<Bookmark>, BookmarkError> {
        let sql = format!(
            "SELECT {}, bc.content, bc.html \
             FROM bookmark b \
             LEFT JOIN bookmark_content bc ON bc.docid = b.id \
             WHERE {}",
            BOOKMARK_COLUMNS, predicate
        );
        let found = self
            .conn
            .query_row(&sql, params![value], |row| {
                let mut bookmark = Self::row_to_bookmark(row)?;
                bookmark.content = row.get(8)?;
                bookmark.html = row.get(9)?;
                Ok(bookmark)
            })
            .optional()?;

        match found {
            Some(mut bookmark) => {
                bookmark.tags = LinkManager::new(self.conn).tags_for(bookmark.id)?;
                Ok(Some(bookmark))
            }
            None => Ok(None),
        }
    }

    fn check_row(draft: &BookmarkDraft) -> Result<(), BookmarkError> {
        if draft.url.trim().is_empty() {
            return Err(BookmarkError::Validation("URL must not be empty".to_string()));
        }
        Ok(())
    }
}

impl<'a> BookmarkManagerTrait for BookmarkManager<'a> {
    fn search(&self, filter: &BookmarkFilter) -> Result<(Vec<Bookmark>, i64), BookmarkError> {
        let bookmarks = self.list(filter)?;
        let total = self.count(filter)?;
        Ok((bookmarks, total))
    }

    /// Runs the list query and enriches every row with its tags (ordered by name).
    fn list(&self, filter: &BookmarkFilter) -> Result<Vec<Bookmark>, BookmarkError> {
        let resolved = filter.resolve()?;
        let query = render_search(&resolved);
        debug!(sql = %query.sql, params = query.params.len(), "bookmark search");

        let mut stmt = self.conn.prepare(&query.sql)?;
        let rows = stmt.query_map(params_from_iter(query.params.iter()), Self::row_to_bookmark)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        self.enrich(&mut results)?;
        Ok(results)
    }

    fn count(&self, filter: &BookmarkFilter) -> Result<i64, BookmarkError> {
        let resolved = filter.resolve()?;
        let query = render_count(&resolved);
        let total: i64 = self
            .conn
            .query_row(&query.sql, params_from_iter(query.params.iter()), |row| row.get(0))?;
        Ok(total)
    }

    fn get(&self, id: i64) -> Result<Bookmark, BookmarkError> {
        self.find_one("b.id = ?1", id)?
            .ok_or_else(|| BookmarkError::NotFound(format!("bookmark {}", id)))
    }

    fn get_by_url(&self, url: &str) -> Result<Option<Bookmark>, BookmarkError> {
        self.find_one("b.url = ?1", url)
    }

    /// Inserts a bookmark row and returns its new id.
    fn insert_row(&self, draft: &BookmarkDraft, modified: &str) -> Result<i64, BookmarkError> {
        Self::check_row(draft)?;
        self.conn
            .execute(
                "INSERT INTO bookmark (url, title, excerpt, image_url, uid, public, modified) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    draft.url,
                    draft.title,
                    draft.excerpt,
                    draft.image_url,
                    draft.owner_id,
                    draft.public,
                    modified
                ],
            )
            .map_err(|e| {
                BookmarkError::from_unique_violation(e, format!("bookmark URL already exists: {}", draft.url))
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Updates an existing bookmark row in place.
    fn update_row(&self, id: i64, draft: &BookmarkDraft, modified: &str) -> Result<(), BookmarkError> {
        Self::check_row(draft)?;
        let affected = self
            .conn
            .execute(
                "UPDATE bookmark SET url = ?1, title = ?2, excerpt = ?3, image_url = ?4, \
                 uid = ?5, public = ?6, modified = ?7 WHERE id = ?8",
                params![
                    draft.url,
                    draft.title,
                    draft.excerpt,
                    draft.image_url,
                    draft.owner_id,
                    draft.public,
                    modified,
                    id
                ],
            )
            .map_err(|e| {
                BookmarkError::from_unique_violation(e, format!("bookmark URL already exists: {}", draft.url))
            })?;

        if affected == 0 {
            return Err(BookmarkError::NotFound(format!("bookmark {}", id)));
        }
        Ok(())
    }

    /// Inserts or updates the content side record; `None` keeps the stored value.
    fn upsert_content(&self, id: i64, title: &str, content: Option<&str>, html: Option<&str>) -> Result<(), BookmarkError> {
        self.conn.execute(
            "INSERT INTO bookmark_content (docid, title, content, html) \
             VALUES (?1, ?2, COALESCE(?3, ''), COALESCE(?4, '')) \
             ON CONFLICT(docid) DO UPDATE SET \
                 title = excluded.title, \
                 content = COALESCE(?3, bookmark_content.content), \
                 html = COALESCE(?4, bookmark_content.html)",
            params![id, title, content, html],
        )?;
        Ok(())
    }

    /// Deletes the bookmark row and its content record. Links are the caller's concern.
    fn delete_row(&self, id: i64) -> Result<(), BookmarkError> {
        self.conn
            .execute("DELETE FROM bookmark_content WHERE docid = ?1", params![id])?;
        let affected = self
            .conn
            .execute("DELETE FROM bookmark WHERE id = ?1", params![id])?;

        if affected == 0 {
            return Err(BookmarkError::NotFound(format!("bookmark {}", id)));
        }
        Ok(())
    }
}
