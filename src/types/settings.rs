use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level tagmark settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub fetch: FetchSettings,
    pub listing: ListingSettings,
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            fetch: FetchSettings::default(),
            listing: ListingSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Where the database and thumbnails live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub database_path: String,
    pub upload_dir: String,
}

impl StorageSettings {
    /// Storage laid out under one data directory: `tagmark.db` and `uploads/`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            database_path: data_dir.join("tagmark.db").to_string_lossy().to_string(),
            upload_dir: data_dir.join("uploads").to_string_lossy().to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self::in_dir(&crate::platform::get_data_dir())
    }
}

/// Outbound page fetching used for title resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Proxy retried when the direct request fails, e.g. `socks5://127.0.0.1:1080`.
    pub proxy: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/112.0.0.0 Safari/537.36"
                .to_string(),
            proxy: None,
        }
    }
}

/// Listing defaults for page-based callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingSettings {
    pub page_size: i64,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self { page_size: 30 }
    }
}
