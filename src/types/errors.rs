use thiserror::Error;

// === BookmarkError ===

/// Errors raised by the tag store, link store, query engine and upsert pipeline.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// Required bookmark data is missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The search filter could not be applied.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    /// Bookmark, tag or account with the given key was not found.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The write would violate a uniqueness rule.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The storage engine failed; the enclosing transaction was rolled back.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl BookmarkError {
    /// Returns true for errors the caller caused (as opposed to storage failures).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BookmarkError::Storage(_))
    }

    /// Maps a UNIQUE / PRIMARY KEY violation to `Conflict`, anything else to `Storage`.
    pub fn from_unique_violation(err: rusqlite::Error, message: impl Into<String>) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                return BookmarkError::Conflict(message.into());
            }
        }
        BookmarkError::Storage(err)
    }
}

// === FetchError ===

/// Errors from resolving a page title over the network.
///
/// The upsert pipeline downgrades all of these to an empty title.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("Fetch network error: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("Fetch returned status {0}")]
    Status(u16),
    /// The page has no usable `<title>`.
    #[error("No title found at {0}")]
    NoTitle(String),
}

// === ThumbnailError ===

/// Errors from thumbnail file storage.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// No image data was supplied.
    #[error("Thumbnail data is empty")]
    Empty,
    /// The base64 payload could not be decoded.
    #[error("Thumbnail decode failed: {0}")]
    Decode(String),
    /// Reading or writing the thumbnail file failed.
    #[error("Thumbnail I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
