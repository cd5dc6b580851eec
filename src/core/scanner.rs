//! Filesystem scanner producing candidate game paths for one system.
//!
//! The scanner walks every root folder of a system and returns the paths of
//! files whose extension is valid for that system. Zip archives are listed
//! rather than returned: each qualifying member shows up as
//! `path/to/Archive.zip/member.ext`.
//!
//! # Rules
//! - Entries whose name starts with a dot are skipped, folders included
//! - Symlinked folders are followed once per canonical path, shared across
//!   all roots of the system, and their files are reported at the link's
//!   logical location
//! - When `Foo.mgl` exists, every other `Foo.*` entry is dropped
//! - Output is sorted by path

use crate::core::config::SystemDef;
use crate::core::error::{LibraryError, Result};
use crate::core::state::{file_name, split_name_ext};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Descriptor files that take priority over same-named ROMs
pub const MGL_EXTENSION: &str = "mgl";
pub const ZIP_EXTENSION: &str = "zip";

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub files: Vec<String>,
    /// Per-root and per-archive problems that did not stop the scan
    pub errors: Vec<LibraryError>,
}

pub struct Scanner {
    system_id: String,
    extensions: HashSet<String>,
}

impl Scanner {
    pub fn new(system: &SystemDef) -> Self {
        Self {
            system_id: system.id.clone(),
            extensions: system.game_extensions(),
        }
    }

    fn is_valid_file(&self, name: &str) -> bool {
        let (_, ext) = split_name_ext(name);
        !ext.is_empty() && self.extensions.contains(&ext.to_lowercase())
    }

    pub fn scan(&self, roots: &[PathBuf]) -> Result<ScanOutput> {
        let mut output = ScanOutput::default();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut usable_roots = 0;

        for root in roots {
            if !root.exists() {
                let err = LibraryError::root_not_found(root);
                log::warn!("{}: {err}", self.system_id);
                output.errors.push(err);
                continue;
            }
            if !root.is_dir() {
                let err = LibraryError::root_not_directory(root);
                log::warn!("{}: {err}", self.system_id);
                output.errors.push(err);
                continue;
            }

            usable_roots += 1;
            match root.canonicalize() {
                Ok(real) => {
                    if !visited.insert(real.clone()) {
                        log::debug!("{}: root {} already scanned", self.system_id, root.display());
                        continue;
                    }
                    self.walk(&real, root, &mut visited, &mut output);
                }
                Err(e) => {
                    log::warn!("{}: cannot resolve {}: {e}", self.system_id, root.display());
                    self.walk(root, root, &mut visited, &mut output);
                }
            }
        }

        if usable_roots == 0 {
            return Err(LibraryError::no_usable_roots(&self.system_id));
        }

        output.files = apply_mgl_priority(output.files);
        output.files.sort();
        output.files.dedup();

        log::debug!(
            "{}: scanned {} files from {} roots ({} problems)",
            self.system_id,
            output.files.len(),
            usable_roots,
            output.errors.len()
        );
        Ok(output)
    }

    /// Walk `real_root`, reporting paths relative to `logical_root`
    fn walk(
        &self,
        real_root: &Path,
        logical_root: &Path,
        visited: &mut HashSet<PathBuf>,
        output: &mut ScanOutput,
    ) {
        let mut entries = WalkDir::new(real_root)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1)
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("{}: {e}", self.system_id);
                    output.errors.push(LibraryError::Walk(e));
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                if entry.file_type().is_dir() {
                    entries.skip_current_dir();
                }
                continue;
            }

            let relative = entry.path().strip_prefix(real_root).unwrap_or(entry.path());
            let logical = logical_root.join(relative);

            if entry.path_is_symlink() {
                self.visit_symlink(entry.path(), &logical, visited, output);
                continue;
            }

            if entry.file_type().is_dir() {
                if let Ok(real) = entry.path().canonicalize() {
                    if !visited.insert(real) {
                        log::debug!("{}: already visited {}", self.system_id, logical.display());
                        entries.skip_current_dir();
                    }
                }
                continue;
            }

            if entry.file_type().is_file() {
                self.visit_file(entry.path(), &logical, output);
            }
        }
    }

    fn visit_symlink(
        &self,
        link: &Path,
        logical: &Path,
        visited: &mut HashSet<PathBuf>,
        output: &mut ScanOutput,
    ) {
        let target = match link.canonicalize() {
            Ok(target) => target,
            Err(e) => {
                log::debug!("{}: dangling link {}: {e}", self.system_id, logical.display());
                return;
            }
        };

        if target.is_dir() {
            if visited.insert(target.clone()) {
                log::debug!(
                    "{}: following {} -> {}",
                    self.system_id,
                    logical.display(),
                    target.display()
                );
                self.walk(&target, logical, visited, output);
            } else {
                log::debug!("{}: link cycle or duplicate at {}", self.system_id, logical.display());
            }
        } else if target.is_file() {
            self.visit_file(&target, logical, output);
        }
    }

    fn visit_file(&self, real: &Path, logical: &Path, output: &mut ScanOutput) {
        let logical_str = logical.to_string_lossy().replace('\\', "/");
        let name = file_name(&logical_str);
        let (_, ext) = split_name_ext(name);

        if ext.eq_ignore_ascii_case(ZIP_EXTENSION) {
            match self.list_archive(real, &logical_str) {
                Ok(members) => output.files.extend(members),
                Err(err) => {
                    log::warn!("{}: skipping archive: {err}", self.system_id);
                    output.errors.push(err);
                }
            }
            return;
        }

        if self.is_valid_file(name) {
            output.files.push(logical_str);
        }
    }

    fn list_archive(&self, real: &Path, logical: &str) -> Result<Vec<String>> {
        let file = File::open(real).map_err(|e| LibraryError::read_failed(real, e))?;
        let archive = zip::ZipArchive::new(file).map_err(|e| LibraryError::archive(real, e))?;

        let members: Vec<String> = archive
            .file_names()
            .filter(|member| !member.ends_with('/'))
            .filter(|member| {
                member
                    .split('/')
                    .all(|segment| !segment.starts_with('.'))
            })
            .filter(|member| self.is_valid_file(file_name(member)))
            .map(|member| format!("{logical}/{member}"))
            .collect();

        log::debug!(
            "{}: {} qualifying members in {}",
            self.system_id,
            members.len(),
            logical
        );
        Ok(members)
    }
}

/// Drop every non-`.mgl` file sharing a base name with an `.mgl` file
pub fn apply_mgl_priority(files: Vec<String>) -> Vec<String> {
    let mut has_mgl: HashMap<String, bool> = HashMap::new();
    for path in &files {
        let (base, ext) = split_name_ext(file_name(path));
        let entry = has_mgl.entry(base.to_lowercase()).or_insert(false);
        *entry |= ext.eq_ignore_ascii_case(MGL_EXTENSION);
    }

    files
        .into_iter()
        .filter(|path| {
            let (base, ext) = split_name_ext(file_name(path));
            ext.eq_ignore_ascii_case(MGL_EXTENSION)
                || !has_mgl.get(&base.to_lowercase()).copied().unwrap_or(false)
        })
        .collect()
}
