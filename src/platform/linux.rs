// Tagmark platform paths for Linux
// Config: ~/.config/tagmark
// Data:   ~/.local/share/tagmark

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Uses `$XDG_CONFIG_HOME/tagmark` if set, otherwise `~/.config/tagmark`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("tagmark"),
        _ => home_dir().join(".config").join("tagmark"),
    }
}

/// Uses `$XDG_DATA_HOME/tagmark` if set, otherwise `~/.local/share/tagmark`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("tagmark"),
        _ => home_dir().join(".local").join("share").join("tagmark"),
    }
}
