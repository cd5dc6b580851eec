//! Data model shared by the scanner, pipeline, persistence and selector.
//!
//! # Public API
//! - [`GameEntry`]: One indexed file with its identifying fields
//! - [`GamelistLine`]: A gamelist line with its optional `<seconds>` prefix
//! - [`SavedTimestamp`]: Ledger record of the newest folder mtime under a root
//! - [`FilterCounts`]: Per-system removal counters for diagnostics
//!
//! # Line Format
//! Gamelist lines are plain paths, or paths prefixed with `<seconds>` where
//! the prefix matches `^<[0-9]+(\.[0-9]+)?>`. A malformed prefix is treated as
//! part of the path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Field separator of serialized GameIndex records
pub const INDEX_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameEntry {
    pub system_id: String,
    pub name: String,
    pub ext: String,
    pub path: String,
    pub menu_path: String,
}

impl GameEntry {
    /// Build an entry from a (possibly prefixed) gamelist path
    pub fn from_path(system_id: &str, line: &str) -> Self {
        let path = GamelistLine::parse(line).path().to_string();
        let (name, ext) = split_name_ext(file_name(&path));
        Self {
            system_id: system_id.to_string(),
            name: name.to_string(),
            ext: ext.to_ascii_lowercase(),
            menu_path: menu_path(&path),
            path,
        }
    }

    /// Natural de-duplication key at index level
    pub fn dedup_key(&self) -> (String, String, String) {
        (
            self.system_id.clone(),
            self.name.to_lowercase(),
            self.ext.clone(),
        )
    }

    /// Serialize as a `systemId|name|ext|path` record
    pub fn to_index_line(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.system_id,
            self.name,
            self.ext,
            self.path,
            sep = INDEX_SEPARATOR
        )
    }

    /// Parse a `systemId|name|ext|path` record. The path keeps any further `|`.
    pub fn from_index_line(line: &str) -> Option<Self> {
        let mut parts = line.splitn(4, INDEX_SEPARATOR);
        let system_id = parts.next()?.trim();
        let name = parts.next()?;
        let ext = parts.next()?;
        let path = parts.next()?;
        if system_id.is_empty() || path.is_empty() {
            return None;
        }
        Some(Self {
            system_id: system_id.to_string(),
            name: name.to_string(),
            ext: ext.to_string(),
            menu_path: menu_path(path),
            path: path.to_string(),
        })
    }
}

/// A gamelist line, optionally carrying a "goes static after N seconds" hint
#[derive(Debug, Clone, PartialEq)]
pub struct GamelistLine {
    seconds: Option<String>,
    path: String,
}

impl GamelistLine {
    pub fn parse(line: &str) -> Self {
        match split_static_prefix(line) {
            Some((seconds, path)) => Self {
                seconds: Some(seconds.to_string()),
                path: path.to_string(),
            },
            None => Self {
                seconds: None,
                path: line.to_string(),
            },
        }
    }

    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            seconds: None,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The static-timing hint in seconds, if present
    pub fn static_seconds(&self) -> Option<f64> {
        self.seconds.as_deref().and_then(|s| s.parse().ok())
    }

    /// Replace the prefix. Returns `None` when `seconds` is not a valid number.
    pub fn with_static(&self, seconds: &str) -> Option<Self> {
        if !is_seconds(seconds) {
            return None;
        }
        Some(Self {
            seconds: Some(seconds.to_string()),
            path: self.path.clone(),
        })
    }
}

impl fmt::Display for GamelistLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.seconds {
            Some(seconds) => write!(f, "<{}>{}", seconds, self.path),
            None => f.write_str(&self.path),
        }
    }
}

/// Strip a valid `<seconds>` prefix, returning the bare path
pub fn strip_static_prefix(line: &str) -> &str {
    split_static_prefix(line).map_or(line, |(_, path)| path)
}

fn split_static_prefix(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('<')?;
    let end = rest.find('>')?;
    let seconds = &rest[..end];
    if is_seconds(seconds) {
        Some((seconds, &rest[end + 1..]))
    } else {
        None
    }
}

/// Matches `[0-9]+(\.[0-9]+)?`
pub fn is_seconds(text: &str) -> bool {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

/// Last `/`-separated segment of a path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Split `Name.ext` into `("Name", "ext")`. Dot-leading names have no extension.
pub fn split_name_ext(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx + 1..]),
        _ => (file_name, ""),
    }
}

/// Display path: `.zip` segments show as their stem, and a
/// `listings/<name>.txt` pair collapses to `<name>`.
pub fn menu_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len().saturating_sub(1);
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    let mut i = 0;
    while i < segments.len() {
        let segment = segments[i];
        if i < last && segment.eq_ignore_ascii_case("listings") {
            if let Some(next) = segments.get(i + 1) {
                let (stem, ext) = split_name_ext(next);
                if i + 1 < last && ext.eq_ignore_ascii_case("txt") {
                    out.push(stem);
                    i += 2;
                    continue;
                }
            }
        }
        if i < last {
            let (stem, ext) = split_name_ext(segment);
            if ext.eq_ignore_ascii_case("zip") {
                out.push(stem);
                i += 1;
                continue;
            }
        }
        out.push(segment);
        i += 1;
    }
    out.join("/")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTimestamp {
    pub system_id: String,
    pub path: String,
    pub mod_time: DateTime<Utc>,
}

/// Counters produced as a side effect of the filter pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    pub white: usize,
    pub black: usize,
    pub static_: usize,
    pub folder: usize,
    pub file: usize,
}

impl FilterCounts {
    pub fn merge(&mut self, other: &FilterCounts) {
        *self += *other;
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterCounts::default()
    }
}

impl AddAssign for FilterCounts {
    fn add_assign(&mut self, other: Self) {
        self.white += other.white;
        self.black += other.black;
        self.static_ += other.static_;
        self.folder += other.folder;
        self.file += other.file;
    }
}

impl fmt::Display for FilterCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "White:{} Black:{} Static:{} Folder:{} File:{}",
            self.white, self.black, self.static_, self.folder, self.file
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixed_line() {
        let line = GamelistLine::parse("<42>/a/mario.nes");
        assert_eq!(line.static_seconds(), Some(42.0));
        assert_eq!(line.path(), "/a/mario.nes");
        assert_eq!(line.to_string(), "<42>/a/mario.nes");
    }

    #[test]
    fn test_parse_fractional_prefix() {
        let line = GamelistLine::parse("<12.5>/games/SNES/zelda.sfc");
        assert_eq!(line.static_seconds(), Some(12.5));
        assert_eq!(line.path(), "/games/SNES/zelda.sfc");
    }

    #[test]
    fn test_malformed_prefix_is_part_of_path() {
        for raw in ["<abc>/x.nes", "<>/x.nes", "<1.>/x.nes", "<4/x.nes"] {
            let line = GamelistLine::parse(raw);
            assert_eq!(line.static_seconds(), None, "{raw}");
            assert_eq!(line.path(), raw);
        }
    }

    #[test]
    fn test_with_static_replaces_prefix() {
        let line = GamelistLine::parse("<3>/a/b.nes").with_static("9.25").unwrap();
        assert_eq!(line.to_string(), "<9.25>/a/b.nes");
        assert!(GamelistLine::plain("/a/b.nes").with_static("x").is_none());
    }

    #[test]
    fn test_game_entry_from_path() {
        let entry = GameEntry::from_path("NES", "<5>/games/NES/Super Mario.NES");
        assert_eq!(entry.name, "Super Mario");
        assert_eq!(entry.ext, "nes");
        assert_eq!(entry.path, "/games/NES/Super Mario.NES");
    }

    #[test]
    fn test_index_line_keeps_pipes_in_path() {
        let line = "Arcade|dkong|mra|/games/Arcade/odd|name/dkong.mra";
        let entry = GameEntry::from_index_line(line).unwrap();
        assert_eq!(entry.path, "/games/Arcade/odd|name/dkong.mra");
        assert_eq!(entry.to_index_line(), line);
        assert!(GameEntry::from_index_line("NES|only|three").is_none());
    }

    #[test]
    fn test_menu_path_collapses_archives_and_listings() {
        assert_eq!(
            menu_path("/games/NES/Pack.zip/Contra.nes"),
            "/games/NES/Pack/Contra.nes"
        );
        assert_eq!(
            menu_path("/games/AO486/listings/Favorites.txt/doom.vhd"),
            "/games/AO486/Favorites/doom.vhd"
        );
        assert_eq!(menu_path("/games/NES/listings"), "/games/NES/listings");
        assert_eq!(menu_path("/games/NES/a.zip"), "/games/NES/a.zip");
    }

    #[test]
    fn test_filter_counts_merge() {
        let mut total = FilterCounts {
            white: 1,
            ..Default::default()
        };
        total.merge(&FilterCounts {
            white: 2,
            file: 3,
            ..Default::default()
        });
        assert_eq!(total.white, 3);
        assert_eq!(total.file, 3);
        assert_eq!(
            total.to_string(),
            "White:3 Black:0 Static:0 Folder:0 File:3"
        );
    }
}
