// Tagmark platform paths
// Per-OS default locations for the settings file, the database and thumbnails.
//
// Uses `cfg(target_os)` to select the implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Environment variable that relocates all tagmark data (database and uploads).
pub const DATA_DIR_ENV: &str = "TAGMARK_DATA_DIR";

/// Returns the platform-specific configuration directory for tagmark.
///
/// - **Linux**: `~/.config/tagmark` (or `$XDG_CONFIG_HOME/tagmark`)
/// - **macOS**: `~/Library/Application Support/Tagmark`
/// - **Windows**: `%APPDATA%/Tagmark`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory for tagmark.
///
/// - **Linux**: `~/.local/share/tagmark` (or `$XDG_DATA_HOME/tagmark`)
/// - **macOS**: `~/Library/Application Support/Tagmark`
/// - **Windows**: `%APPDATA%/Tagmark`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Returns the data directory named by `TAGMARK_DATA_DIR`, if set and non-empty.
pub fn data_dir_override() -> Option<PathBuf> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}
