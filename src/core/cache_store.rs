//! Thread-safe in-memory cache of every list the frontend works with.
//!
//! The store keeps two maps behind one [`RwLock`]:
//! - `masters`: the first value ever stored under a key, never changed afterwards
//! - `lists`: the working copy that consumers read and mutate
//!
//! [`CacheStore::reset_all`] rebuilds the working copy from the masters. Every
//! read returns an owned copy, so callers never hold the lock.

use crate::core::error::{LibraryError, Result};
use crate::core::persistence::{read_lines_with_retry, LEDGER_FILE};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const MASTERLIST_KEY: &str = "Masterlist.txt";
pub const GAME_INDEX_KEY: &str = "GameIndex";
pub const HISTORY_KEY: &str = "History.txt";

#[derive(Debug, Default)]
struct Maps {
    masters: HashMap<String, Vec<String>>,
    lists: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct CacheStore {
    inner: RwLock<Maps>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // The maps hold plain lists, so a panic mid-write cannot leave them invalid
    fn read(&self) -> RwLockReadGuard<'_, Maps> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Maps> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole store with the line files found in `dir`.
    ///
    /// Reads every `.txt` file and every extension-less file except the
    /// ledger. Unreadable files are skipped with a warning. Returns the number
    /// of keys loaded.
    pub fn reload_all(&self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir).map_err(|e| LibraryError::read_failed(dir, e))?;

        let mut loaded: HashMap<String, Vec<String>> = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| LibraryError::read_failed(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name == LEDGER_FILE || name.starts_with('.') {
                continue;
            }
            let wanted = match path.extension() {
                None => true,
                Some(ext) => ext.eq_ignore_ascii_case("txt"),
            };
            if !wanted {
                continue;
            }

            match read_lines_with_retry(&path) {
                Ok(lines) => {
                    loaded.insert(name.to_string(), lines);
                }
                Err(e) => log::warn!("Skipping unreadable cache file: {e}"),
            }
        }

        let count = loaded.len();
        let mut maps = self.write();
        maps.masters = loaded.clone();
        maps.lists = loaded;
        log::debug!("Reloaded {count} cache keys from {}", dir.display());
        Ok(count)
    }

    /// Copy of the working list; empty when the key is unknown
    pub fn get_list(&self, name: &str) -> Vec<String> {
        self.read().lists.get(name).cloned().unwrap_or_default()
    }

    /// Store a working list. The first value stored under a key also becomes its master.
    pub fn set_list(&self, name: &str, lines: Vec<String>) {
        let mut maps = self.write();
        if !maps.masters.contains_key(name) {
            maps.masters.insert(name.to_string(), lines.clone());
        }
        maps.lists.insert(name.to_string(), lines);
    }

    /// Store a list as both master and working copy
    pub fn seed_list(&self, name: &str, lines: Vec<String>) {
        let mut maps = self.write();
        maps.masters.insert(name.to_string(), lines.clone());
        maps.lists.insert(name.to_string(), lines);
    }

    /// Append to a working list without touching its master
    pub fn append(&self, name: &str, lines: &[String]) {
        let mut maps = self.write();
        maps.lists
            .entry(name.to_string())
            .or_default()
            .extend(lines.iter().cloned());
    }

    /// Drop the working copy only; `reset_all` brings it back
    pub fn delete_key(&self, name: &str) -> bool {
        self.write().lists.remove(name).is_some()
    }

    /// Drop a key and its master, so `reset_all` does not bring it back
    pub fn purge_key(&self, name: &str) -> bool {
        let mut maps = self.write();
        let had_master = maps.masters.remove(name).is_some();
        maps.lists.remove(name).is_some() || had_master
    }

    /// Restore every working list from its master
    pub fn reset_all(&self) {
        let mut maps = self.write();
        maps.lists = maps.masters.clone();
    }

    /// Working-copy keys, sorted
    pub fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().lists.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().lists.contains_key(name)
    }

    /// Length of a working list without copying it
    pub fn list_len(&self, name: &str) -> usize {
        self.read().lists.get(name).map_or(0, Vec::len)
    }
}
