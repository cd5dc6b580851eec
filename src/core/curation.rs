//! Hand-maintained curation lists.
//!
//! Each system may have up to three files in the filterlist directory:
//! `<id>_whitelist.txt`, `<id>_blacklist.txt` (one name per line) and
//! `<id>_staticlist.txt` (`<seconds> name`, the angle brackets optional).
//! Entries are stored as lowercase title keys and resolved against a system's
//! game extensions before matching, see [`normalize_name`].

use crate::core::error::{LibraryError, Result};
use crate::core::persistence::read_lines_with_retry;
use crate::core::state::{file_name, is_seconds, split_name_ext, strip_static_prefix};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Strip any `<ts>` prefix, take the last path segment, trim and lowercase.
/// The extension is kept.
pub fn title_key(entry: &str) -> String {
    let path = strip_static_prefix(entry.trim());
    file_name(path).trim().to_lowercase()
}

/// [`title_key`] without a trailing `.ext` when `ext` is one of `extensions`.
///
/// Only known game extensions are stripped, so dotted titles such as
/// `Dr. Mario` or `Mr.Do` survive, and a name that is already normalized
/// normalizes to itself.
pub fn normalize_name(entry: &str, extensions: &HashSet<String>) -> String {
    let key = title_key(entry);
    let (name, ext) = split_name_ext(&key);
    if extensions.contains(ext) {
        name.trim_end().to_string()
    } else {
        key
    }
}

pub fn whitelist_path(dir: &Path, system_id: &str) -> PathBuf {
    dir.join(format!("{system_id}_whitelist.txt"))
}

pub fn blacklist_path(dir: &Path, system_id: &str) -> PathBuf {
    dir.join(format!("{system_id}_blacklist.txt"))
}

pub fn staticlist_path(dir: &Path, system_id: &str) -> PathBuf {
    dir.join(format!("{system_id}_staticlist.txt"))
}

/// Curation lists of one system. `None` means the file does not exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurationSet {
    pub whitelist: Option<HashSet<String>>,
    pub blacklist: Option<HashSet<String>>,
    /// Normalized name -> seconds text
    pub staticlist: Option<HashMap<String, String>>,
}

impl CurationSet {
    pub fn load(filterlist_dir: &Path, system_id: &str) -> Result<Self> {
        let whitelist = read_optional(&whitelist_path(filterlist_dir, system_id))?
            .map(|lines| name_set(&lines));
        let blacklist = read_optional(&blacklist_path(filterlist_dir, system_id))?
            .map(|lines| name_set(&lines));
        let staticlist = read_optional(&staticlist_path(filterlist_dir, system_id))?
            .map(|lines| static_map(&lines));

        let set = Self {
            whitelist,
            blacklist,
            staticlist,
        };
        log::debug!("{system_id}: loaded curation lists {}", set.summary());
        Ok(set)
    }

    /// Normalize every entry against a system's game extensions
    pub fn resolve(&self, extensions: &HashSet<String>) -> Self {
        let names = |set: &HashSet<String>| -> HashSet<String> {
            set.iter()
                .map(|name| normalize_name(name, extensions))
                .collect()
        };
        Self {
            whitelist: self.whitelist.as_ref().map(names),
            blacklist: self.blacklist.as_ref().map(names),
            staticlist: self.staticlist.as_ref().map(|map| {
                map.iter()
                    .map(|(name, seconds)| (normalize_name(name, extensions), seconds.clone()))
                    .collect()
            }),
        }
    }

    pub fn with_whitelist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.whitelist = Some(names.into_iter().map(|n| title_key(n.as_ref())).collect());
        self
    }

    pub fn with_blacklist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blacklist = Some(names.into_iter().map(|n| title_key(n.as_ref())).collect());
        self
    }

    /// Entries are `(seconds, name)` pairs; invalid seconds are ignored
    pub fn with_staticlist<I, S, T>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        self.staticlist = Some(
            entries
                .into_iter()
                .filter(|(seconds, _)| is_seconds(seconds.as_ref()))
                .map(|(seconds, name)| (title_key(name.as_ref()), seconds.as_ref().to_string()))
                .collect(),
        );
        self
    }

    fn summary(&self) -> String {
        let count = |len: Option<usize>| len.map_or("-".to_string(), |n| n.to_string());
        format!(
            "white={} black={} static={}",
            count(self.whitelist.as_ref().map(HashSet::len)),
            count(self.blacklist.as_ref().map(HashSet::len)),
            count(self.staticlist.as_ref().map(HashMap::len)),
        )
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }
    match read_lines_with_retry(path) {
        Ok(lines) => Ok(Some(lines)),
        Err(LibraryError::ReadFailed { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn name_set(lines: &[String]) -> HashSet<String> {
    lines
        .iter()
        .map(|line| title_key(line))
        .filter(|name| !name.is_empty())
        .collect()
}

fn static_map(lines: &[String]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in lines {
        match parse_static_entry(line) {
            Some((seconds, name)) => {
                map.insert(name, seconds);
            }
            None => log::debug!("Skipping malformed staticlist line: {line}"),
        }
    }
    map
}

/// Parse `<12.5> Name` or `12.5 Name` into `("12.5", "name")`, see [`title_key`]
pub fn parse_static_entry(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let (seconds, rest) = match line.strip_prefix('<') {
        Some(inner) => {
            let end = inner.find('>')?;
            (&inner[..end], &inner[end + 1..])
        }
        None => line.split_once(char::is_whitespace)?,
    };
    let seconds = seconds.trim();
    let name = title_key(rest);
    if !is_seconds(seconds) || name.is_empty() {
        return None;
    }
    Some((seconds.to_string(), name))
}
