//! Shared initialization for every command.
//!
//! [`LibraryContext`] loads and validates the configuration, builds the system
//! catalog and owns the [`CacheStore`] that the builder, selector and search
//! share.
//!
//! # Initialization Steps
//! 1. **Config loading**: explicit `--config` path, or the default file
//! 2. **Validation**: disable rules and group names are checked up front
//! 3. **Store creation**: an empty cache, filled by a build or a reload
//!
//! Gamelists on disk hold the deduplicated scan without curation, so a reload
//! runs the curation lists again before anything reads the cache.

use crate::core::builder::LibraryBuilder;
use crate::core::cache_store::CacheStore;
use crate::core::config::LibraryConfig;
use crate::core::error::{LibraryError, Result};
use crate::core::persistence::system_id_from_gamelist_key;
use crate::core::pipeline::{curate_lines, stage_b};
use crate::core::selector::{Selector, SelectorOptions};
use crate::core::systems::SystemCatalog;
use std::path::Path;
use std::sync::Arc;

pub struct LibraryContext {
    pub config: LibraryConfig,
    pub catalog: SystemCatalog,
    pub store: Arc<CacheStore>,
}

impl LibraryContext {
    pub fn initialize(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => LibraryConfig::load_from(path)?,
            None => LibraryConfig::load_or_create()?,
        };
        Self::from_config(config)
    }

    pub fn from_config(config: LibraryConfig) -> Result<Self> {
        config.validate()?;
        let catalog = SystemCatalog::new(config.systems.clone());
        catalog.expand_groups(&config.attract.include)?;
        catalog.expand_groups(&config.attract.exclude)?;

        log::debug!(
            "Initialized context: {} systems, gamelists in {}",
            catalog.len(),
            config.gamelist_dir.display()
        );
        Ok(Self {
            config,
            catalog,
            store: Arc::new(CacheStore::new()),
        })
    }

    pub fn builder(&self) -> LibraryBuilder {
        LibraryBuilder::new(
            self.config.clone(),
            self.catalog.clone(),
            Arc::clone(&self.store),
        )
    }

    /// Fill the store from the gamelist directory written by a previous build
    /// and curate every gamelist the catalog knows.
    pub fn load_cache(&self) -> Result<usize> {
        let dir = &self.config.gamelist_dir;
        if !dir.is_dir() {
            return Err(LibraryError::NoGamelists);
        }
        let count = self.store.reload_all(dir)?;
        let has_gamelists = self
            .store
            .list_keys()
            .iter()
            .any(|key| system_id_from_gamelist_key(key).is_some());
        if !has_gamelists {
            return Err(LibraryError::NoGamelists);
        }
        self.curate_gamelists()?;
        Ok(count)
    }

    fn curate_gamelists(&self) -> Result<()> {
        for key in self.store.list_keys() {
            let Some(system) = system_id_from_gamelist_key(&key)
                .and_then(|system_id| self.catalog.lookup(system_id))
            else {
                continue;
            };
            let (unique, _) = stage_b(&self.store.get_list(&key));
            let (curated, counts) = curate_lines(
                &system.id,
                &unique,
                &self.config.filterlist_dir,
                &self.config.list,
                &self.catalog,
            )?;
            log::debug!("{}: {} cached after curation ({counts})", system.id, curated.len());
            self.store.seed_list(&key, curated);
        }
        Ok(())
    }

    pub fn selector(&self) -> Result<Selector> {
        let options = SelectorOptions::from_config(&self.config.attract, &self.catalog)?;
        Ok(Selector::new(Arc::clone(&self.store), options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_cache_without_gamelists() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let config = LibraryConfig::with_dirs(temp.path().join("missing"), temp.path());
        let context = LibraryContext::from_config(config)?;
        assert!(matches!(
            context.load_cache(),
            Err(LibraryError::NoGamelists)
        ));

        let config = LibraryConfig::with_dirs(temp.path(), temp.path());
        std::fs::write(temp.path().join("GameIndex"), "NES|a|nes|/a.nes\n")?;
        let context = LibraryContext::from_config(config)?;
        assert!(matches!(
            context.load_cache(),
            Err(LibraryError::NoGamelists)
        ));
        Ok(())
    }

    #[test]
    fn test_bad_attract_group_is_rejected() {
        let mut config = LibraryConfig::with_dirs("/g", "/f");
        config.systems.retain(|system| system.id != "Amiga");
        config.attract.include = vec!["Computer".to_string()];
        assert!(LibraryContext::from_config(config).is_err());
    }

    #[test]
    fn test_load_cache_applies_curation() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let gamelists = temp.path().join("gamelists");
        let filterlists = temp.path().join("filterlists");
        std::fs::create_dir_all(&gamelists)?;
        std::fs::create_dir_all(&filterlists)?;
        std::fs::write(
            gamelists.join("NES_gamelist.txt"),
            "/g/NES/Contra.nes\n/g/NES/Dr. Mario.nes\n/g/NES/Metroid.nes\n",
        )?;
        std::fs::write(filterlists.join("NES_blacklist.txt"), "dr. mario\n")?;
        std::fs::write(filterlists.join("NES_staticlist.txt"), "<9> Contra\n")?;

        let context = LibraryContext::from_config(LibraryConfig::with_dirs(&gamelists, &filterlists))?;
        context.load_cache()?;

        let expected = vec!["<9>/g/NES/Contra.nes".to_string(), "/g/NES/Metroid.nes".to_string()];
        assert_eq!(context.store.get_list("NES_gamelist.txt"), expected);
        context.store.reset_all();
        assert_eq!(context.store.get_list("NES_gamelist.txt"), expected);
        Ok(())
    }
}
