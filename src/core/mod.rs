//! Core functionality for the attract-library tool.
//!
//! This module provides the building blocks of the game library index:
//! scanning, filtering, the shared cache, persistence, the incremental
//! builder, and the selector and search that consume the cache.

pub mod builder;
pub mod cache_store;
pub mod config;
pub mod context;
pub mod curation;
pub mod dirs;
pub mod error;
pub mod output;
pub mod persistence;
pub mod pipeline;
pub mod rules;
pub mod scanner;
pub mod search;
pub mod selector;
pub mod state;
pub mod systems;

// === Error handling ===
// Core error types and result type used throughout the application
pub use error::{LibraryError, Result};

// === Data model ===
// Entries, gamelist lines, ledger records and filter counters
pub use state::{FilterCounts, GameEntry, GamelistLine, SavedTimestamp};

// === Configuration ===
pub use config::{AttractConfig, Category, DisableRules, LibraryConfig, ListConfig, SystemDef};
pub use systems::SystemCatalog;

// === Scanning and filtering ===
// Filesystem walk plus the A -> B -> C stage pipeline
pub use curation::{normalize_name, title_key, CurationSet};
pub use pipeline::{curate_lines, stage_a, stage_b, stage_c};
pub use rules::{CompiledRules, DisableRule};
pub use scanner::{ScanOutput, Scanner};

// === Cache and persistence ===
pub use cache_store::{CacheStore, GAME_INDEX_KEY, HISTORY_KEY, MASTERLIST_KEY};
pub use persistence::Ledger;

// === Builder ===
pub use builder::{BuildOptions, BuildReport, LibraryBuilder, SystemReport, SystemState};

// === Consumers ===
// Random/sequential selection with history, and title search
pub use search::{load_index, search};
pub use selector::{Pick, Selector, SelectorOptions};

// === Command initialization ===
pub use context::LibraryContext;

// === Output formatting ===
// Unified output formatting for consistent CLI presentation
pub use output::{print_error, print_info, print_section_header, print_success};
