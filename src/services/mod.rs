// Tagmark services
// Services compose the managers into operations: the upsert pipeline, title fetching, thumbnails, settings.

pub mod bookmark_pipeline;
pub mod settings_engine;
pub mod thumbnail_store;
pub mod title_fetcher;
