//! Link Manager for tagmark.
//!
//! Owns the many-to-many `bookmark_tag` relation. Writes go through
//! [`in_transaction`], so they join the caller's transaction when there is one.

use rusqlite::{params, params_from_iter, Connection};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::database::in_transaction;
use crate::types::errors::BookmarkError;
use crate::types::tag::Tag;

/// Upper bound on `?` placeholders per batched lookup.
const LOOKUP_CHUNK: usize = 500;

/// Trait defining bookmark-tag relation operations.
pub trait LinkManagerTrait {
    fn links_for(&self, bookmark_id: i64) -> Result<BTreeSet<i64>, BookmarkError>;
    fn reconcile(&self, bookmark_id: i64, desired_tag_ids: &[i64]) -> Result<(), BookmarkError>;
    fn delete_all_for(&self, bookmark_id: i64) -> Result<usize, BookmarkError>;
    fn tags_for(&self, bookmark_id: i64) -> Result<Vec<Tag>, BookmarkError>;
    fn tags_for_bookmarks(&self, bookmark_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>, BookmarkError>;
}

/// Relation store backed by a SQLite connection or an open transaction.
pub struct LinkManager<'a> {
    conn: &'a Connection,
}

impl<'a> LinkManager<'a> {
    /// Creates a new `LinkManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

/// Builds `?,?,?` for `n` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

impl<'a> LinkManagerTrait for LinkManager<'a> {
    fn links_for(&self, bookmark_id: i64) -> Result<BTreeSet<i64>, BookmarkError> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag_id FROM bookmark_tag WHERE bookmark_id = ?1")?;
        let rows = stmt.query_map(params![bookmark_id], |row| row.get::<_, i64>(0))?;

        let mut ids = BTreeSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }

    /// Brings the links of `bookmark_id` to exactly `desired_tag_ids`.
    ///
    /// Stale links are deleted, missing ones inserted with `INSERT OR IGNORE`,
    /// unchanged ones are not touched. Calling it twice with the same set is a no-op.
    fn reconcile(&self, bookmark_id: i64, desired_tag_ids: &[i64]) -> Result<(), BookmarkError> {
        let desired: BTreeSet<i64> = desired_tag_ids.iter().copied().collect();

        in_transaction(self.conn, |conn| {
            let current = LinkManager::new(conn).links_for(bookmark_id)?;

            let stale: Vec<i64> = current.difference(&desired).copied().collect();
            let missing: Vec<i64> = desired.difference(&current).copied().collect();

            {
                let mut delete = conn.prepare_cached(
                    "DELETE FROM bookmark_tag WHERE bookmark_id = ?1 AND tag_id = ?2",
                )?;
                for tag_id in &stale {
                    delete.execute(params![bookmark_id, tag_id])?;
                }
            }
            {
                let mut insert = conn.prepare_cached(
                    "INSERT OR IGNORE INTO bookmark_tag (bookmark_id, tag_id) VALUES (?1, ?2)",
                )?;
                for tag_id in &missing {
                    insert.execute(params![bookmark_id, tag_id])?;
                }
            }

            debug!(
                bookmark_id,
                removed = stale.len(),
                added = missing.len(),
                kept = current.len() - stale.len(),
                "reconciled tag links"
            );
            Ok(())
        })
    }

    /// Removes every link of a bookmark, returning how many were deleted.
    fn delete_all_for(&self, bookmark_id: i64) -> Result<usize, BookmarkError> {
        let removed = self.conn.execute(
            "DELETE FROM bookmark_tag WHERE bookmark_id = ?1",
            params![bookmark_id],
        )?;
        Ok(removed)
    }

    /// Tags of one bookmark, ordered by name.
    fn tags_for(&self, bookmark_id: i64) -> Result<Vec<Tag>, BookmarkError> {
        let mut map = self.tags_for_bookmarks(&[bookmark_id])?;
        Ok(map.remove(&bookmark_id).unwrap_or_default())
    }

    /// Batched enrichment: tags for every given bookmark, each list ordered by name.
    ///
    /// Bookmarks without tags are absent from the map.
    fn tags_for_bookmarks(&self, bookmark_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>, BookmarkError> {
        let mut map: HashMap<i64, Vec<Tag>> = HashMap::with_capacity(bookmark_ids.len());

        for chunk in bookmark_ids.chunks(LOOKUP_CHUNK) {
            let sql = format!(
                "SELECT bt.bookmark_id, t.id, t.name \
                 FROM bookmark_tag bt \
                 JOIN tag t ON t.id = bt.tag_id \
                 WHERE bt.bookmark_id IN ({}) \
                 ORDER BY t.name",
                placeholders(chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Tag {
                        id: row.get(1)?,
                        name: row.get(2)?,
                    },
                ))
            })?;

            for row in rows {
                let (bookmark_id, tag) = row?;
                map.entry(bookmark_id).or_default().push(tag);
            }
        }

        Ok(map)
    }
}
