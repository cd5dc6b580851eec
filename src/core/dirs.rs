use crate::core::error::{LibraryError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "attract-library";

pub fn get_config_directory() -> Result<PathBuf> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config"))),
        "macos" => dirs::home_dir().map(|home| home.join("Library/Application Support")),
        _ => dirs::config_dir(),
    };

    base.map(|base| base.join(APP_DIR))
        .ok_or(LibraryError::ConfigDirectoryNotFound)
}

pub fn get_cache_directory() -> Result<PathBuf> {
    let base = match std::env::consts::OS {
        "linux" | "freebsd" | "netbsd" | "openbsd" => std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|home| home.join(".cache"))),
        "macos" => dirs::home_dir().map(|home| home.join("Library/Caches")),
        _ => dirs::cache_dir(),
    };

    base.map(|base| base.join(APP_DIR))
        .ok_or(LibraryError::ConfigDirectoryNotFound)
}

/// Default location of gamelists, Masterlist, GameIndex and the ledger
pub fn default_gamelist_directory() -> Result<PathBuf> {
    Ok(get_cache_directory()?.join("gamelists"))
}

/// Default location of the hand-maintained curation lists
pub fn default_filterlist_directory() -> Result<PathBuf> {
    Ok(get_config_directory()?.join("filterlists"))
}
