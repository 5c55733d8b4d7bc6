//! App Core for tagmark.
//!
//! Central struct holding the database, settings and the two external
//! capabilities the upsert pipeline needs.

use std::sync::Arc;

use crate::database::connection::Database;
use crate::services::bookmark_pipeline::BookmarkPipeline;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::thumbnail_store::{FsThumbnailStore, ThumbnailStore};
use crate::services::title_fetcher::{HttpTitleFetcher, TitleFetcher};

/// Central application struct.
///
/// Managers and the pipeline are created on demand via `db.connection()`
/// because they borrow the connection with a lifetime parameter.
pub struct App {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub fetcher: Box<dyn TitleFetcher + Send>,
    pub thumbnails: Box<dyn ThumbnailStore + Send>,
}

impl App {
    /// Loads settings, then opens the database and builds the HTTP fetcher and
    /// thumbnail store they describe.
    pub fn new(config_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(config_path);
        let settings = settings_engine.load()?;

        let db = Arc::new(Database::open(&settings.storage.database_path)?);
        let fetcher = HttpTitleFetcher::new(&settings.fetch)?;
        let thumbnails = FsThumbnailStore::new(&settings.storage.upload_dir);

        Ok(Self::with_parts(db, settings_engine, Box::new(fetcher), Box::new(thumbnails)))
    }

    /// Assembles an app from already-built parts.
    pub fn with_parts(
        db: Arc<Database>,
        settings_engine: SettingsEngine,
        fetcher: Box<dyn TitleFetcher + Send>,
        thumbnails: Box<dyn ThumbnailStore + Send>,
    ) -> Self {
        Self {
            db,
            settings_engine,
            fetcher,
            thumbnails,
        }
    }

    /// Upsert pipeline bound to this app's connection and capabilities.
    pub fn pipeline(&self) -> BookmarkPipeline<'_> {
        BookmarkPipeline::new(self.db.connection(), self.fetcher.as_ref(), self.thumbnails.as_ref())
    }

    /// Page size used by page-based listings.
    pub fn page_size(&self) -> i64 {
        self.settings_engine.get_settings().listing.page_size.max(1)
    }
}
