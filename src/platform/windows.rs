// Tagmark platform paths for Windows
// Config and data: %APPDATA%/Tagmark

use std::env;
use std::path::PathBuf;

fn app_data_dir() -> PathBuf {
    let appdata =
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("Tagmark")
}

pub fn get_config_dir() -> PathBuf {
    app_data_dir()
}

pub fn get_data_dir() -> PathBuf {
    app_data_dir()
}
