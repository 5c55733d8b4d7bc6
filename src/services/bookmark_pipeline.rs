//! Bookmark upsert pipeline.
//!
//! Composes the tag, link and bookmark managers into the atomic write
//! operations: create-or-update and delete. Title resolution runs before the
//! write transaction opens; thumbnail removal runs after it commits.

use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use super::thumbnail_store::ThumbnailStore;
use super::title_fetcher::TitleFetcher;
use crate::database::in_transaction;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::link_manager::{LinkManager, LinkManagerTrait};
use crate::managers::tag_manager::{TagManager, TagManagerTrait};
use crate::types::bookmark::{Bookmark, BookmarkDraft};
use crate::types::errors::BookmarkError;
use crate::url_utils::clean_url;

/// Timestamp layout stored in `bookmark.modified`.
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write pipeline over one connection and the two external capabilities.
pub struct BookmarkPipeline<'a> {
    conn: &'a Connection,
    fetcher: &'a dyn TitleFetcher,
    thumbnails: &'a dyn ThumbnailStore,
}

impl<'a> BookmarkPipeline<'a> {
    pub fn new(conn: &'a Connection, fetcher: &'a dyn TitleFetcher, thumbnails: &'a dyn ThumbnailStore) -> Self {
        Self {
            conn,
            fetcher,
            thumbnails,
        }
    }

    /// Creates (`draft.id == None`) or updates a bookmark and replaces its tag set.
    ///
    /// Tag resolution, the row write, link reconciliation and the content
    /// record commit or roll back together. The returned bookmark carries its
    /// tags in resolution order.
    ///
    /// # Errors
    /// `Validation` for a missing or unparsable URL, `NotFound` when updating a
    /// missing id, `Conflict` when the URL belongs to another bookmark.
    pub fn create_or_update(&self, draft: BookmarkDraft, tag_names: &[String]) -> Result<Bookmark, BookmarkError> {
        let mut draft = draft;
        draft.url = clean_url(&draft.url)?;
        draft.title = draft.title.trim().to_string();
        if draft.title.is_empty() {
            draft.title = self.resolve_title(&draft.url);
        }
        let modified = match draft.modified.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => Utc::now().format(MODIFIED_FORMAT).to_string(),
        };

        let bookmark = in_transaction(self.conn, |conn| {
            let tags = TagManager::new(conn).resolve_or_create_batch(tag_names)?;
            let bookmarks = BookmarkManager::new(conn);

            let id = match draft.id {
                None => bookmarks.insert_row(&draft, &modified)?,
                Some(id) => {
                    bookmarks.update_row(id, &draft, &modified)?;
                    id
                }
            };

            let tag_ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
            LinkManager::new(conn).reconcile(id, &tag_ids)?;
            bookmarks.upsert_content(id, &draft.title, draft.content.as_deref(), draft.html.as_deref())?;

            let mut bookmark = bookmarks.get(id)?;
            bookmark.tags = tags;
            Ok::<_, BookmarkError>(bookmark)
        })?;

        info!(
            id = bookmark.id,
            url = %bookmark.url,
            tags = bookmark.tags.len(),
            created = draft.id.is_none(),
            "bookmark saved"
        );
        Ok(bookmark)
    }

    /// Deletes a bookmark with its links and content record, then its thumbnail.
    pub fn delete(&self, id: i64) -> Result<(), BookmarkError> {
        let image = in_transaction(self.conn, |conn| Self::delete_in(conn, id))?;
        info!(id, "bookmark deleted");
        self.remove_thumbnail(image.as_deref());
        Ok(())
    }

    /// Deletes the bookmark stored under `url`.
    pub fn delete_by_url(&self, url: &str) -> Result<(), BookmarkError> {
        let url = url.trim();
        let bookmark = BookmarkManager::new(self.conn)
            .get_by_url(url)?
            .ok_or_else(|| BookmarkError::NotFound(format!("bookmark {}", url)))?;
        self.delete(bookmark.id)
    }

    /// Deletes every listed bookmark in one transaction. Unknown ids are
    /// skipped; returns how many bookmarks were removed.
    pub fn delete_many(&self, ids: &[i64]) -> Result<usize, BookmarkError> {
        let images = in_transaction(self.conn, |conn| {
            let mut images = Vec::new();
            let mut removed = 0;
            for &id in ids {
                match Self::delete_in(conn, id) {
                    Ok(image) => {
                        removed += 1;
                        images.push(image);
                    }
                    Err(BookmarkError::NotFound(_)) => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok((removed, images))
        });
        let (removed, images) = images?;

        info!(removed, requested = ids.len(), "bookmarks deleted");
        for image in &images {
            self.remove_thumbnail(image.as_deref());
        }
        Ok(removed)
    }

    /// Row-level delete inside an open transaction; returns the thumbnail name.
    fn delete_in(conn: &Connection, id: i64) -> Result<Option<String>, BookmarkError> {
        let bookmarks = BookmarkManager::new(conn);
        let existing = bookmarks.get(id)?;
        LinkManager::new(conn).delete_all_for(id)?;
        bookmarks.delete_row(id)?;
        Ok(existing.image_url)
    }

    fn resolve_title(&self, url: &str) -> String {
        match self.fetcher.fetch_page_title(url) {
            Ok(title) => title.trim().to_string(),
            Err(e) => {
                warn!(url, error = %e, "title fetch failed, saving with empty title");
                String::new()
            }
        }
    }

    fn remove_thumbnail(&self, name: Option<&str>) {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return;
        };
        if let Err(e) = self.thumbnails.delete_thumbnail(name) {
            warn!(name, error = %e, "thumbnail removal failed");
        }
    }
}
