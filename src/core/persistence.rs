//! On-disk artifacts of the library index.
//!
//! # Files
//! - `<id>_gamelist.txt`: one path per line, optionally `<seconds>`-prefixed
//! - `Masterlist.txt`: every system's unfiltered files, in `# SYSTEM: <id>` blocks
//! - `GameIndex`: `systemId|name|ext|path` records
//! - `Modtime`: JSON ledger of the newest folder mtime seen per system root
//!
//! Writes go through [`write_atomic`]; reads of line files go through
//! [`read_lines_with_retry`].

use crate::core::error::{LibraryError, Result};
use crate::core::state::{GameEntry, SavedTimestamp};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

pub const MASTERLIST_FILE: &str = "Masterlist.txt";
pub const GAME_INDEX_FILE: &str = "GameIndex";
pub const LEDGER_FILE: &str = "Modtime";
pub const GAMELIST_SUFFIX: &str = "_gamelist.txt";

const SYSTEM_MARKER: &str = "# SYSTEM: ";
const READ_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(50);

pub fn gamelist_file_name(system_id: &str) -> String {
    format!("{system_id}{GAMELIST_SUFFIX}")
}

pub fn gamelist_path(dir: &Path, system_id: &str) -> PathBuf {
    dir.join(gamelist_file_name(system_id))
}

/// `"NES_gamelist.txt"` -> `Some("NES")`
pub fn system_id_from_gamelist_key(key: &str) -> Option<&str> {
    key.strip_suffix(GAMELIST_SUFFIX)
        .filter(|system_id| !system_id.is_empty())
}

// === Masterlist blocks ===

pub fn system_marker(system_id: &str) -> String {
    format!("{SYSTEM_MARKER}{system_id}")
}

fn marker_id(line: &str) -> Option<&str> {
    line.strip_prefix(SYSTEM_MARKER).map(str::trim_end)
}

/// Drop the block whose marker id equals `system_id` exactly, up to the next marker
pub fn excise_system_block(lines: &[String], system_id: &str) -> Vec<String> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut skipping = false;
    for line in lines {
        if let Some(id) = marker_id(line) {
            skipping = id == system_id;
        }
        if !skipping {
            kept.push(line.clone());
        }
    }
    kept
}

pub fn append_system_block(lines: &mut Vec<String>, system_id: &str, block: &[String]) {
    lines.push(system_marker(system_id));
    lines.extend(block.iter().cloned());
}

/// Ids of every block in the Masterlist, in file order
pub fn masterlist_systems(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| marker_id(line))
        .map(str::to_string)
        .collect()
}

// === GameIndex ===

pub fn parse_game_index(lines: &[String]) -> Vec<GameEntry> {
    let mut entries = Vec::with_capacity(lines.len());
    for line in lines {
        match GameEntry::from_index_line(line) {
            Some(entry) => entries.push(entry),
            None => log::warn!("Skipping malformed GameIndex line: {line}"),
        }
    }
    entries
}

pub fn game_index_lines(entries: &[GameEntry]) -> Vec<String> {
    entries.iter().map(GameEntry::to_index_line).collect()
}

pub fn remove_system_entries(entries: &mut Vec<GameEntry>, system_id: &str) {
    entries.retain(|entry| entry.system_id != system_id);
}

/// Replace every record of `system_id` with `replacement`
pub fn replace_system_entries(
    entries: &mut Vec<GameEntry>,
    system_id: &str,
    replacement: Vec<GameEntry>,
) {
    remove_system_entries(entries, system_id);
    entries.extend(replacement);
}

// === Timestamp ledger ===

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    records: Vec<SavedTimestamp>,
}

impl Ledger {
    /// Load the ledger. A missing or unreadable file is an empty ledger.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(ledger) => ledger,
            Err(e) => {
                log::warn!("Ignoring ledger, all systems will be rebuilt: {e}");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(LibraryError::read_failed(path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let records: Vec<SavedTimestamp> = serde_json::from_str(&content)
            .map_err(|e| LibraryError::ledger_parse_failed(path, e))?;

        let mut ledger = Self::default();
        for record in records {
            ledger.upsert(record);
        }
        Ok(ledger)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.records)?;
        write_atomic(path, content.as_bytes())
    }

    pub fn lookup(&self, system_id: &str, path: &str) -> Option<&SavedTimestamp> {
        self.records
            .iter()
            .find(|record| record.system_id == system_id && record.path == path)
    }

    /// Insert or replace the record for `(system_id, path)`
    pub fn upsert(&mut self, record: SavedTimestamp) {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.system_id == record.system_id && existing.path == record.path)
        {
            Some(existing) => existing.mod_time = record.mod_time,
            None => self.records.push(record),
        }
    }

    pub fn records(&self) -> &[SavedTimestamp] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// === File helpers ===

/// Write to a sibling temp file, sync, then rename over `path`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| LibraryError::directory_creation_failed(parent, e))?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let written = fs::File::create(&tmp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(LibraryError::write_failed(&tmp_path, e));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        LibraryError::write_failed(path, e)
    })
}

pub fn write_lines_atomic(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    write_atomic(path, content.as_bytes())
}

fn is_transient(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
    )
}

/// Read trimmed, non-blank lines, retrying transient errors
pub fn read_lines_with_retry(path: &Path) -> Result<Vec<String>> {
    let mut attempt = 1;
    loop {
        match fs::read_to_string(path) {
            Ok(content) => return Ok(clean_lines(&content)),
            Err(e) if attempt < READ_ATTEMPTS && is_transient(&e) => {
                log::warn!(
                    "Transient error reading {} (attempt {attempt}/{READ_ATTEMPTS}): {e}",
                    path.display()
                );
                std::thread::sleep(RETRY_DELAY * attempt);
                attempt += 1;
            }
            Err(e) => return Err(LibraryError::read_failed(path, e)),
        }
    }
}

pub fn clean_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Newest modification time among `root` and every directory below it
pub fn latest_dir_mtime(root: &Path) -> Result<DateTime<Utc>> {
    let mut latest = fs::metadata(root)
        .and_then(|meta| meta.modified())
        .map_err(|e| LibraryError::read_failed(root, e))?;

    for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(modified) = entry.metadata().ok().and_then(|meta| meta.modified().ok()) {
            latest = latest.max(modified);
        }
    }

    Ok(DateTime::<Utc>::from(latest))
}

pub fn read_gamelist(dir: &Path, system_id: &str) -> Result<Vec<String>> {
    read_lines_with_retry(&gamelist_path(dir, system_id))
}

pub fn write_gamelist(dir: &Path, system_id: &str, lines: &[String]) -> Result<()> {
    write_lines_atomic(&gamelist_path(dir, system_id), lines)
}

pub fn gamelist_exists(dir: &Path, system_id: &str) -> bool {
    gamelist_path(dir, system_id).is_file()
}

/// Delete a system's gamelist. Returns whether a file was removed.
pub fn remove_gamelist(dir: &Path, system_id: &str) -> Result<bool> {
    let path = gamelist_path(dir, system_id);
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(LibraryError::write_failed(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_excise_exact_marker_only() {
        let master = lines(&[
            "# SYSTEM: NES",
            "/g/NES/a.nes",
            "# SYSTEM: NESHacks",
            "/g/NESHacks/b.nes",
            "# SYSTEM: SNES",
            "/g/SNES/c.sfc",
        ]);
        let kept = excise_system_block(&master, "NES");
        assert_eq!(
            kept,
            lines(&[
                "# SYSTEM: NESHacks",
                "/g/NESHacks/b.nes",
                "# SYSTEM: SNES",
                "/g/SNES/c.sfc",
            ])
        );
    }

    #[test]
    fn test_excise_then_append_moves_block_to_end() {
        let mut master = excise_system_block(
            &lines(&["# SYSTEM: NES", "/old.nes", "# SYSTEM: GBA", "/x.gba"]),
            "NES",
        );
        append_system_block(&mut master, "NES", &lines(&["/new.nes"]));
        assert_eq!(masterlist_systems(&master), lines(&["GBA", "NES"]));
        assert!(!master.contains(&"/old.nes".to_string()));
    }

    #[test]
    fn test_parse_game_index_skips_short_lines() {
        let parsed = parse_game_index(&lines(&[
            "NES|Contra|nes|/g/NES/Contra.nes",
            "broken|line",
            "SNES|Zelda|sfc|/g/SNES/Zel|da.sfc",
        ]));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].path, "/g/SNES/Zel|da.sfc");
    }

    #[test]
    fn test_replace_system_entries() {
        let mut entries = parse_game_index(&lines(&[
            "NES|A|nes|/a.nes",
            "SNES|B|sfc|/b.sfc",
        ]));
        replace_system_entries(
            &mut entries,
            "NES",
            vec![GameEntry::from_path("NES", "/c.nes")],
        );
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/b.sfc", "/c.nes"]);
    }

    #[test]
    fn test_ledger_upsert_keeps_one_record() {
        let mut ledger = Ledger::default();
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        for mod_time in [first, second] {
            ledger.upsert(SavedTimestamp {
                system_id: "NES".into(),
                path: "/g/NES".into(),
                mod_time,
            });
        }
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.lookup("NES", "/g/NES").unwrap().mod_time, second);
        assert!(ledger.lookup("NES", "/other").is_none());
    }

    #[test]
    fn test_ledger_missing_and_corrupt_are_empty() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join(LEDGER_FILE);
        assert!(Ledger::load(&path).is_empty());

        fs::write(&path, "[{ not json")?;
        assert!(Ledger::try_load(&path).is_err());
        assert!(Ledger::load(&path).is_empty());
        Ok(())
    }

    #[test]
    fn test_ledger_save_and_load() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join(LEDGER_FILE);
        let mut ledger = Ledger::default();
        ledger.upsert(SavedTimestamp {
            system_id: "GBA".into(),
            path: "/g/GBA".into(),
            mod_time: Utc.with_ymd_and_hms(2023, 3, 4, 5, 6, 7).unwrap(),
        });
        ledger.save(&path)?;
        assert_eq!(Ledger::load(&path), ledger);
        Ok(())
    }

    #[test]
    fn test_write_atomic_replaces_content() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("sub").join("NES_gamelist.txt");
        write_lines_atomic(&path, &lines(&["/a.nes"]))?;
        write_lines_atomic(&path, &lines(&["/b.nes", "/c.nes"]))?;
        assert_eq!(fs::read_to_string(&path)?, "/b.nes\n/c.nes\n");
        assert!(!temp.path().join("sub").join("NES_gamelist.txt.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_read_lines_trims_and_drops_blanks() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("list.txt");
        fs::write(&path, "  /a.nes  \n\n\t\n<3>/b.nes\r\n")?;
        assert_eq!(read_lines_with_retry(&path)?, lines(&["/a.nes", "<3>/b.nes"]));
        assert!(read_lines_with_retry(&temp.path().join("missing.txt")).is_err());
        Ok(())
    }

    #[test]
    fn test_latest_dir_mtime_sees_nested_folders() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested)?;

        let old = filetime::FileTime::from_unix_time(1_000_000, 0);
        let new = filetime::FileTime::from_unix_time(2_000_000, 0);
        filetime::set_file_mtime(temp.path(), old)?;
        filetime::set_file_mtime(temp.path().join("a"), old)?;
        filetime::set_file_mtime(&nested, new)?;

        let latest = latest_dir_mtime(temp.path())?;
        assert_eq!(latest.timestamp(), 2_000_000);
        Ok(())
    }

    #[test]
    fn test_gamelist_key_helpers() {
        assert_eq!(gamelist_file_name("NES"), "NES_gamelist.txt");
        assert_eq!(system_id_from_gamelist_key("NES_gamelist.txt"), Some("NES"));
        assert_eq!(system_id_from_gamelist_key("_gamelist.txt"), None);
        assert_eq!(system_id_from_gamelist_key("History.txt"), None);
    }

    #[test]
    fn test_remove_gamelist() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        write_gamelist(temp.path(), "NES", &lines(&["/g/a.nes"]))?;

        assert!(remove_gamelist(temp.path(), "NES")?);
        assert!(!gamelist_exists(temp.path(), "NES"));
        assert!(!remove_gamelist(temp.path(), "NES")?);
        Ok(())
    }
}
