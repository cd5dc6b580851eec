//! Incremental library builder.
//!
//! [`LibraryBuilder::build`] decides for every selected system whether its
//! on-disk gamelist can be reused or has to be rebuilt from a fresh scan,
//! runs the filter pipeline, fills the [`CacheStore`], and finally rewrites
//! `Masterlist.txt`, `GameIndex` and the `Modtime` ledger in one pass.
//!
//! # System States
//! - **REUSED**: folders unchanged since the last build, gamelist read from disk
//! - **FRESH**: scanned, filtered and written again
//! - **EMPTY**: nothing left after the structural filters
//! - **FAILED**: no usable root, or the gamelist could not be produced
//! - **CANCELLED**: the cancel flag was raised before the system started
//!
//! Systems run in parallel; their Masterlist blocks, GameIndex records and
//! ledger updates are merged in catalog order once all of them are done.

use crate::core::cache_store::{CacheStore, GAME_INDEX_KEY, MASTERLIST_KEY};
use crate::core::config::{LibraryConfig, SystemDef};
use crate::core::error::{LibraryError, Result};
use crate::core::persistence::{
    append_system_block, excise_system_block, game_index_lines, gamelist_exists,
    gamelist_file_name, latest_dir_mtime, parse_game_index, read_gamelist, read_lines_with_retry,
    remove_gamelist, replace_system_entries, write_gamelist, write_lines_atomic, Ledger, GAME_INDEX_FILE,
    LEDGER_FILE, MASTERLIST_FILE,
};
use crate::core::pipeline::{curate_lines, stage_a, stage_b};
use crate::core::rules::CompiledRules;
use crate::core::scanner::Scanner;
use crate::core::state::{FilterCounts, GameEntry, SavedTimestamp};
use crate::core::systems::SystemCatalog;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Rebuild every system regardless of folder timestamps
    pub overwrite: bool,
    /// Restrict the build to these systems or groups
    pub systems: Option<Vec<String>>,
    pub cancel: Arc<AtomicBool>,
}

impl BuildOptions {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemState {
    Reused,
    Fresh,
    Empty,
    Failed,
    Cancelled,
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SystemState::Reused => "REUSED",
            SystemState::Fresh => "FRESH",
            SystemState::Empty => "EMPTY",
            SystemState::Failed => "FAILED",
            SystemState::Cancelled => "CANCELLED",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone)]
pub struct SystemReport {
    pub system_id: String,
    pub state: SystemState,
    /// Lines in the on-disk gamelist (after Stage B)
    pub disk_count: usize,
    /// Lines in the cache entry (after Stage C)
    pub cache_count: usize,
    pub counts: FilterCounts,
    pub error: Option<String>,
}

impl SystemReport {
    fn new(system_id: &str, state: SystemState) -> Self {
        Self {
            system_id: system_id.to_string(),
            state,
            disk_count: 0,
            cache_count: 0,
            counts: FilterCounts::default(),
            error: None,
        }
    }

    fn failed(system_id: &str, error: &LibraryError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(system_id, SystemState::Failed)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub total_games: usize,
    pub systems: Vec<SystemReport>,
    pub artifacts_written: bool,
    pub cancelled: bool,
}

impl BuildReport {
    pub fn count(&self, state: SystemState) -> usize {
        self.systems.iter().filter(|s| s.state == state).count()
    }

    pub fn system(&self, system_id: &str) -> Option<&SystemReport> {
        self.systems.iter().find(|s| s.system_id == system_id)
    }

    pub fn totals(&self) -> FilterCounts {
        let mut totals = FilterCounts::default();
        for system in &self.systems {
            totals.merge(&system.counts);
        }
        totals
    }
}

/// Result of one system's pass, merged serially afterwards
struct SystemOutcome {
    report: SystemReport,
    /// Stage A survivors to store as the system's Masterlist block
    master_block: Option<Vec<String>>,
    index_entries: Option<Vec<GameEntry>>,
    ledger_updates: Vec<SavedTimestamp>,
}

impl SystemOutcome {
    fn report_only(report: SystemReport) -> Self {
        Self {
            report,
            master_block: None,
            index_entries: None,
            ledger_updates: Vec::new(),
        }
    }
}

pub struct LibraryBuilder {
    config: LibraryConfig,
    catalog: SystemCatalog,
    store: Arc<CacheStore>,
}

impl LibraryBuilder {
    pub fn new(config: LibraryConfig, catalog: SystemCatalog, store: Arc<CacheStore>) -> Self {
        Self {
            config,
            catalog,
            store,
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn build(&self, options: &BuildOptions) -> Result<BuildReport> {
        // Configuration errors surface before anything is written
        let selected = self.select_systems(options)?;
        let rules = self.compile_rules(&selected)?;
        self.validate_list_groups()?;

        let ram_only = self.config.list.ram_only;
        let dir = &self.config.gamelist_dir;
        let masterlist_path = dir.join(MASTERLIST_FILE);
        let index_path = dir.join(GAME_INDEX_FILE);
        let ledger_path = dir.join(LEDGER_FILE);

        let artifacts_missing = !masterlist_path.is_file() || !index_path.is_file();
        if artifacts_missing {
            log::info!("Masterlist or GameIndex missing, rebuilding every system");
        }
        let force_fresh = options.overwrite || artifacts_missing;

        let mut ledger = Ledger::load(&ledger_path);
        let mut masterlist = read_existing(&masterlist_path);
        let mut index = parse_game_index(&read_existing(&index_path));

        log::info!(
            "Building {} systems ({} ledger records)",
            selected.len(),
            ledger.len()
        );

        let outcomes: Vec<SystemOutcome> = selected
            .par_iter()
            .map(|system| {
                let rules = rules.get(&system.id).cloned().unwrap_or_default();
                self.process_system(system, &rules, &ledger, force_fresh, options)
            })
            .collect();

        let mut report = BuildReport::default();
        for outcome in outcomes {
            let system_id = outcome.report.system_id.clone();
            if let Some(block) = outcome.master_block {
                masterlist = excise_system_block(&masterlist, &system_id);
                if !block.is_empty() {
                    append_system_block(&mut masterlist, &system_id, &block);
                }
            }
            if let Some(entries) = outcome.index_entries {
                replace_system_entries(&mut index, &system_id, entries);
            }
            for record in outcome.ledger_updates {
                ledger.upsert(record);
            }
            if matches!(outcome.report.state, SystemState::Reused | SystemState::Fresh) {
                report.total_games += outcome.report.cache_count;
            }
            report.systems.push(outcome.report);
        }

        report.cancelled =
            options.is_cancelled() || report.count(SystemState::Cancelled) > 0;
        if report.cancelled {
            log::warn!("Build cancelled, skipping Masterlist, GameIndex and ledger writes");
            return Ok(report);
        }

        let index_lines = game_index_lines(&index);
        let needs_write = report.count(SystemState::Fresh) > 0 || artifacts_missing;
        if needs_write && !ram_only {
            std::fs::create_dir_all(dir)
                .map_err(|e| LibraryError::directory_creation_failed(dir, e))?;
            write_lines_atomic(&masterlist_path, &masterlist)?;
            write_lines_atomic(&index_path, &index_lines)?;
            ledger.save(&ledger_path)?;
            report.artifacts_written = true;
            log::info!(
                "Wrote {} Masterlist lines and {} GameIndex records",
                masterlist.len(),
                index_lines.len()
            );
        }

        self.store.set_list(MASTERLIST_KEY, masterlist);
        self.store.set_list(GAME_INDEX_KEY, index_lines);

        log::info!(
            "Build finished: {} games, {} fresh, {} reused, {} empty, {} failed",
            report.total_games,
            report.count(SystemState::Fresh),
            report.count(SystemState::Reused),
            report.count(SystemState::Empty),
            report.count(SystemState::Failed)
        );
        Ok(report)
    }

    fn select_systems(&self, options: &BuildOptions) -> Result<Vec<SystemDef>> {
        if self.catalog.is_empty() {
            return Err(LibraryError::NoSystemsConfigured);
        }
        let selected = match &options.systems {
            Some(names) if !names.is_empty() => self
                .catalog
                .select(names)?
                .into_iter()
                .cloned()
                .collect(),
            _ => self.catalog.systems().to_vec(),
        };
        Ok(selected)
    }

    fn compile_rules(&self, systems: &[SystemDef]) -> Result<HashMap<String, CompiledRules>> {
        systems
            .iter()
            .map(|system| {
                CompiledRules::compile(&self.config.disable, &system.id)
                    .map(|rules| (system.id.clone(), rules))
            })
            .collect()
    }

    fn validate_list_groups(&self) -> Result<()> {
        let list = &self.config.list;
        for names in [
            &list.exclude,
            &list.whitelist_include,
            &list.whitelist_exclude,
            &list.blacklist_include,
            &list.blacklist_exclude,
            &list.staticlist_include,
            &list.staticlist_exclude,
        ] {
            self.catalog.expand_groups(names)?;
        }
        Ok(())
    }

    fn process_system(
        &self,
        system: &SystemDef,
        rules: &CompiledRules,
        ledger: &Ledger,
        force_fresh: bool,
        options: &BuildOptions,
    ) -> SystemOutcome {
        if options.is_cancelled() {
            return SystemOutcome::report_only(SystemReport::new(
                &system.id,
                SystemState::Cancelled,
            ));
        }

        let (modified, ledger_updates) = check_modified(system, ledger);
        let dir = &self.config.gamelist_dir;

        if !modified && !force_fresh && gamelist_exists(dir, &system.id) {
            match self.reuse_system(system) {
                Ok(report) => return SystemOutcome::report_only(report),
                Err(e) => log::warn!("{}: cannot reuse gamelist, rebuilding: {e}", system.id),
            }
        }

        match self.fresh_system(system, rules, ledger_updates) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("{}: {e}", system.id);
                SystemOutcome::report_only(SystemReport::failed(&system.id, &e))
            }
        }
    }

    fn reuse_system(&self, system: &SystemDef) -> Result<SystemReport> {
        let lines = read_gamelist(&self.config.gamelist_dir, &system.id)?;
        let (unique, counts_b) = stage_b(&lines);
        let (curated, counts_c) = self.curate(system, &unique)?;

        let mut report = SystemReport::new(&system.id, SystemState::Reused);
        report.disk_count = lines.len();
        report.cache_count = curated.len();
        report.counts = counts_b;
        report.counts.merge(&counts_c);

        self.store
            .set_list(&gamelist_file_name(&system.id), curated);
        log::info!(
            "{}: REUSED {} on disk, {} in cache",
            system.id,
            report.disk_count,
            report.cache_count
        );
        Ok(report)
    }

    fn fresh_system(
        &self,
        system: &SystemDef,
        rules: &CompiledRules,
        ledger_updates: Vec<SavedTimestamp>,
    ) -> Result<SystemOutcome> {
        let scanned = Scanner::new(system).scan(&system.folders)?;
        let (structural, counts_a) = stage_a(&scanned.files, rules);

        if structural.is_empty() {
            log::info!("{}: EMPTY after structural filters", system.id);
            self.forget_gamelist(&system.id)?;
            let mut report = SystemReport::new(&system.id, SystemState::Empty);
            report.counts = counts_a;
            return Ok(SystemOutcome {
                report,
                master_block: Some(Vec::new()),
                index_entries: Some(Vec::new()),
                ledger_updates: Vec::new(),
            });
        }

        let index_entries = index_entries(&system.id, &structural);
        let (unique, counts_b) = stage_b(&structural);

        if !self.config.list.ram_only {
            write_gamelist(&self.config.gamelist_dir, &system.id, &unique)?;
        }

        let (curated, counts_c) = self.curate(system, &unique)?;

        let mut report = SystemReport::new(&system.id, SystemState::Fresh);
        report.disk_count = unique.len();
        report.cache_count = curated.len();
        report.counts = counts_a;
        report.counts.merge(&counts_b);
        report.counts.merge(&counts_c);

        self.store
            .set_list(&gamelist_file_name(&system.id), curated);
        log::info!(
            "{}: FRESH {} on disk, {} in cache ({})",
            system.id,
            report.disk_count,
            report.cache_count,
            report.counts
        );

        Ok(SystemOutcome {
            report,
            master_block: Some(structural),
            index_entries: Some(index_entries),
            ledger_updates,
        })
    }

    /// An EMPTY system keeps neither a gamelist on disk nor a cache entry
    fn forget_gamelist(&self, system_id: &str) -> Result<()> {
        self.store.purge_key(&gamelist_file_name(system_id));
        if !self.config.list.ram_only && remove_gamelist(&self.config.gamelist_dir, system_id)? {
            log::info!("{system_id}: removed stale gamelist");
        }
        Ok(())
    }

    fn curate(&self, system: &SystemDef, lines: &[String]) -> Result<(Vec<String>, FilterCounts)> {
        curate_lines(
            &system.id,
            lines,
            &self.config.filterlist_dir,
            &self.config.list,
            &self.catalog,
        )
    }
}

/// Whether any root changed since its ledger record, plus the new records
fn check_modified(system: &SystemDef, ledger: &Ledger) -> (bool, Vec<SavedTimestamp>) {
    let mut modified = false;
    let mut updates = Vec::new();

    for root in &system.folders {
        let path = root.to_string_lossy().to_string();
        let latest = match latest_dir_mtime(root) {
            Ok(latest) => latest,
            Err(e) => {
                log::debug!("{}: cannot stat {path}: {e}", system.id);
                continue;
            }
        };

        match ledger.lookup(&system.id, &path) {
            Some(record) if latest <= record.mod_time => {}
            Some(_) => {
                log::debug!("{}: {path} changed since last build", system.id);
                modified = true;
            }
            None => {
                log::debug!("{}: {path} has no ledger record", system.id);
                modified = true;
            }
        }

        updates.push(SavedTimestamp {
            system_id: system.id.clone(),
            path,
            mod_time: latest,
        });
    }
    (modified, updates)
}

/// GameIndex records for Stage A survivors, one per (name, ext)
fn index_entries(system_id: &str, paths: &[String]) -> Vec<GameEntry> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .map(|path| GameEntry::from_path(system_id, path))
        .filter(|entry| seen.insert(entry.dedup_key()))
        .collect()
}

fn read_existing(path: &std::path::Path) -> Vec<String> {
    if !path.is_file() {
        return Vec::new();
    }
    read_lines_with_retry(path).unwrap_or_else(|e| {
        log::warn!("Treating unreadable artifact as empty: {e}");
        Vec::new()
    })
}
