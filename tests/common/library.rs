//! Fake game library management and setup utilities
//!
//! Provides functions for creating system folders, game files, zip archives
//! and curation lists inside a temporary directory, plus a matching config.

#![allow(dead_code)]

use anyhow::Result;
use attract_library::core::config::{Category, LibraryConfig, SystemDef};
use attract_library::core::context::LibraryContext;
use filetime::FileTime;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test library setup result. The TempDir must be kept alive for the
/// duration of the test to prevent cleanup.
pub struct TestLibrary {
    pub temp_dir: TempDir,
    pub games_dir: PathBuf,
    pub config: LibraryConfig,
}

impl TestLibrary {
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn gamelist_dir(&self) -> &Path {
        &self.config.gamelist_dir
    }

    pub fn filterlist_dir(&self) -> &Path {
        &self.config.filterlist_dir
    }

    pub fn system_root(&self, system_id: &str) -> PathBuf {
        self.games_dir.join(system_id)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.json")
    }

    /// Persist the current config so the binary can load it with `--config`
    pub fn write_config(&self) -> Result<PathBuf> {
        let path = self.config_path();
        self.config.save_to(&path)?;
        Ok(path)
    }

    pub fn context(&self) -> Result<LibraryContext> {
        Ok(LibraryContext::from_config(self.config.clone())?)
    }

    /// Register a system with a single root under the games directory
    pub fn add_system(&mut self, id: &str, category: Category, extensions: &[&str]) -> Result<PathBuf> {
        let root = self.system_root(id);
        fs::create_dir_all(&root)?;
        self.config.systems.push(SystemDef {
            folders: vec![root.clone()],
            ..SystemDef::new(id, id, category, &[], extensions)
        });
        Ok(root)
    }

    pub fn read_gamelist(&self, system_id: &str) -> Result<Vec<String>> {
        let content = fs::read_to_string(
            self.gamelist_dir()
                .join(format!("{system_id}_gamelist.txt")),
        )?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

/// Sets up an empty library with no systems and no disable rules
pub fn setup_test_library() -> Result<TestLibrary> {
    let temp_dir = TempDir::new()?;
    let games_dir = temp_dir.path().join("games");
    fs::create_dir_all(&games_dir)?;

    let mut config = LibraryConfig::with_dirs(
        temp_dir.path().join("gamelists"),
        temp_dir.path().join("filterlists"),
    );
    config.systems.clear();
    config.disable.clear();
    fs::create_dir_all(&config.filterlist_dir)?;

    Ok(TestLibrary {
        temp_dir,
        games_dir,
        config,
    })
}

/// Creates empty game files relative to `root`
pub fn create_games(root: &Path, files: &[&str]) -> Result<()> {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, b"rom")?;
    }
    Ok(())
}

/// Creates a stored zip archive with the given member names
pub fn create_zip(path: &Path, members: &[&str]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = zip::ZipWriter::new(fs::File::create(path)?);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for member in members {
        writer.start_file(*member, options)?;
        writer.write_all(b"rom")?;
    }
    writer.finish()?;
    Ok(())
}

/// Writes `<id>_<kind>.txt` into the filterlist directory
pub fn write_curation(library: &TestLibrary, system_id: &str, kind: &str, lines: &[&str]) -> Result<()> {
    let path = library
        .filterlist_dir()
        .join(format!("{system_id}_{kind}.txt"));
    fs::write(path, lines.join("\n"))?;
    Ok(())
}

/// Moves a folder's mtime to `unix_seconds`
pub fn set_dir_mtime(path: &Path, unix_seconds: i64) -> Result<()> {
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_seconds, 0))?;
    Ok(())
}

/// Seconds since the epoch, shifted by `offset`
pub fn now_plus(offset: i64) -> i64 {
    chrono::Utc::now().timestamp() + offset
}
