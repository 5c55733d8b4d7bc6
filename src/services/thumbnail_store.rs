//! Thumbnail file storage.
//!
//! Bookmarks reference a thumbnail by the bare file name kept in
//! `bookmark.image_url`; the files themselves live in the upload directory.

use std::fs;
use std::io;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;
use uuid::Uuid;

use crate::types::errors::ThumbnailError;

/// Capability to persist and remove thumbnail files.
pub trait ThumbnailStore {
    /// Stores the image bytes and returns the file name to keep on the bookmark.
    fn save_thumbnail(&self, data: &[u8]) -> Result<String, ThumbnailError>;
    /// Removes a stored thumbnail. A missing file is not an error.
    fn delete_thumbnail(&self, name: &str) -> Result<(), ThumbnailError>;
}

/// Thumbnails stored as `<uuid>.jpg` files in one directory.
pub struct FsThumbnailStore {
    dir: PathBuf,
}

impl FsThumbnailStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolves a stored name inside the upload directory, refusing anything
    /// that could escape it.
    fn path_for(&self, name: &str) -> Result<PathBuf, ThumbnailError> {
        if name.contains(['/', '\\']) || name == ".." || name == "." {
            return Err(ThumbnailError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid thumbnail name: {}", name),
            )));
        }
        Ok(self.dir.join(name))
    }
}

impl ThumbnailStore for FsThumbnailStore {
    fn save_thumbnail(&self, data: &[u8]) -> Result<String, ThumbnailError> {
        if data.is_empty() {
            return Err(ThumbnailError::Empty);
        }
        fs::create_dir_all(&self.dir)?;

        let name = format!("{}.jpg", Uuid::new_v4());
        fs::write(self.dir.join(&name), data)?;
        debug!(name = %name, bytes = data.len(), "thumbnail stored");
        Ok(name)
    }

    fn delete_thumbnail(&self, name: &str) -> Result<(), ThumbnailError> {
        if name.is_empty() {
            return Ok(());
        }
        match fs::remove_file(self.path_for(name)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Decodes a base64 image, accepting an optional `data:image/...;base64,` prefix.
pub fn decode_base64_image(input: &str) -> Result<Vec<u8>, ThumbnailError> {
    let payload = match input.find(',') {
        Some(idx) => &input[idx + 1..],
        None => input,
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(ThumbnailError::Empty);
    }
    STANDARD
        .decode(payload)
        .map_err(|e| ThumbnailError::Decode(e.to_string()))
}
