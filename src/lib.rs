//! Attract Library - game library index and cache for attract-mode frontends.
//!
//! This library scans per-system game folders, filters the results through a
//! deterministic pipeline, keeps incremental on-disk indexes, and serves the
//! results from a thread-safe in-memory cache to a title selector and search.
//!
//! # Public API
//! The main public interface is re-exported from the [`core`] module, which provides:
//! - Filesystem scanning and the filter pipeline
//! - The shared cache store and on-disk artifacts
//! - The incremental library builder
//! - Title selection, history and search
//! - Error handling and result types

pub mod commands;
pub mod core;

// Re-export the core public API for external users
pub use core::{
    // Builder
    BuildOptions,
    BuildReport,
    // Cache
    CacheStore,
    LibraryBuilder,
    // Configuration
    LibraryConfig,
    LibraryContext,
    // Error handling
    LibraryError,
    // Consumers
    Pick,
    Result,
    Selector,
    SelectorOptions,
    SystemCatalog,
    SystemState,
};
