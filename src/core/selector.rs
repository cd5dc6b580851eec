//! Attract-mode title selection and history navigation.
//!
//! [`Selector`] draws titles from the cached `*_gamelist.txt` lists without
//! repeating a title until its list is exhausted, records every title it
//! hands out in the `History.txt` cache list, and lets the caller step back
//! and forth through that history.

use crate::core::cache_store::{CacheStore, HISTORY_KEY};
use crate::core::config::AttractConfig;
use crate::core::error::Result;
use crate::core::persistence::system_id_from_gamelist_key;
use crate::core::state::GamelistLine;
use crate::core::systems::{allowed_for, SystemCatalog};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Invoked after every successful cursor move, e.g. to restart a playback timer
pub type CursorCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct SelectorOptions {
    pub shuffle: bool,
    /// Expanded system ids; empty allows every system
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl SelectorOptions {
    pub fn from_config(attract: &AttractConfig, catalog: &SystemCatalog) -> Result<Self> {
        Ok(Self {
            shuffle: attract.random,
            include: catalog.expand_groups(&attract.include)?,
            exclude: catalog.expand_groups(&attract.exclude)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub system_id: String,
    /// Path with any `<seconds>` prefix removed
    pub path: String,
    pub static_seconds: Option<f64>,
}

struct SelectorState {
    /// Lines already handed out, per gamelist key
    used: HashMap<String, HashSet<String>>,
    cursor: Option<usize>,
    rng: StdRng,
}

pub struct Selector {
    store: Arc<CacheStore>,
    options: SelectorOptions,
    state: Mutex<SelectorState>,
    on_cursor_move: Option<CursorCallback>,
}

impl Selector {
    pub fn new(store: Arc<CacheStore>, options: SelectorOptions) -> Self {
        Self::with_seed(store, options, rand::random::<u64>())
    }

    /// Deterministic selector for reproducible runs
    pub fn with_seed(store: Arc<CacheStore>, options: SelectorOptions, seed: u64) -> Self {
        Self {
            store,
            options,
            state: Mutex::new(SelectorState {
                used: HashMap::new(),
                cursor: None,
                rng: StdRng::seed_from_u64(seed),
            }),
            on_cursor_move: None,
        }
    }

    pub fn with_cursor_callback(mut self, callback: CursorCallback) -> Self {
        self.on_cursor_move = Some(callback);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SelectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cursor_moved(&self) {
        if let Some(callback) = &self.on_cursor_move {
            callback();
        }
    }

    /// Gamelist keys allowed by the attract include/exclude lists, sorted
    fn candidate_keys(&self) -> Vec<String> {
        self.store
            .list_keys()
            .into_iter()
            .filter(|key| match system_id_from_gamelist_key(key) {
                Some(system_id) => {
                    allowed_for(system_id, &self.options.include, &self.options.exclude)
                }
                None => false,
            })
            .filter(|key| self.store.list_len(key) > 0)
            .collect()
    }

    pub fn pick_random(&self) -> Option<Pick> {
        let keys = self.candidate_keys();
        let pick = {
            let mut state = self.lock();
            let state = &mut *state;

            let key = if self.options.shuffle {
                keys.choose(&mut state.rng)?.clone()
            } else {
                keys.first()?.clone()
            };

            let lines = self.store.get_list(&key);
            let used = state.used.entry(key.clone()).or_default();
            let mut unused: Vec<&String> = lines.iter().filter(|l| !used.contains(*l)).collect();
            if unused.is_empty() {
                log::debug!("{key}: pool exhausted, starting over");
                used.clear();
                unused = lines.iter().collect();
            }

            let line = if self.options.shuffle {
                (*unused.choose(&mut state.rng)?).clone()
            } else {
                (*unused.first()?).clone()
            };
            used.insert(line.clone());

            let parsed = GamelistLine::parse(&line);
            Pick {
                system_id: system_id_from_gamelist_key(&key)?.to_string(),
                path: parsed.path().to_string(),
                static_seconds: parsed.static_seconds(),
            }
        };

        log::debug!("Picked {} from {}", pick.path, pick.system_id);
        self.record(&pick.path);
        Some(pick)
    }

    /// Record an externally chosen title, e.g. a search launch
    pub fn play(&self, path: &str) {
        self.record(path);
    }

    fn record(&self, path: &str) {
        {
            let mut state = self.lock();
            self.store.append(HISTORY_KEY, &[path.to_string()]);
            let len = self.store.list_len(HISTORY_KEY);
            state.cursor = len.checked_sub(1);
        }
        self.cursor_moved();
    }

    /// Step forward in history. `None` at the newest entry.
    pub fn next(&self) -> Option<String> {
        self.step(|cursor, len| (cursor + 1 < len).then_some(cursor + 1))
    }

    /// Step back in history. `None` at the oldest entry.
    pub fn back(&self) -> Option<String> {
        self.step(|cursor, _| cursor.checked_sub(1))
    }

    fn step(&self, advance: impl Fn(usize, usize) -> Option<usize>) -> Option<String> {
        let entry = {
            let mut state = self.lock();
            let history = self.store.get_list(HISTORY_KEY);
            let cursor = state.cursor?;
            let target = advance(cursor, history.len())?;
            let entry = history.get(target)?.clone();
            state.cursor = Some(target);
            entry
        };
        self.cursor_moved();
        Some(entry)
    }

    /// Title under the history cursor
    pub fn current(&self) -> Option<String> {
        let cursor = self.lock().cursor?;
        self.store.get_list(HISTORY_KEY).get(cursor).cloned()
    }

    /// Forget which titles were already picked, e.g. after a cache reload
    pub fn reset_pools(&self) {
        self.lock().used.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store_with(lists: &[(&str, &[&str])]) -> Arc<CacheStore> {
        let store = Arc::new(CacheStore::new());
        for (key, lines) in lists {
            store.set_list(key, lines.iter().map(|s| s.to_string()).collect());
        }
        store
    }

    #[test]
    fn test_no_repeats_until_exhausted() {
        let store = store_with(&[("NES_gamelist.txt", &["/a.nes", "/b.nes", "/c.nes"])]);
        let selector = Selector::with_seed(
            store,
            SelectorOptions {
                shuffle: true,
                ..Default::default()
            },
            7,
        );

        let mut seen: HashSet<String> = HashSet::new();
        for _ in 0..3 {
            let pick = selector.pick_random().unwrap();
            assert!(seen.insert(pick.path));
        }
        assert_eq!(seen.len(), 3);
        assert!(selector.pick_random().is_some());
    }

    #[test]
    fn test_sequential_pick_and_static_prefix() {
        let store = store_with(&[
            ("SNES_gamelist.txt", &["/s.sfc"]),
            ("NES_gamelist.txt", &["<12.5>/a.nes", "/b.nes"]),
            ("Masterlist.txt", &["# SYSTEM: NES"]),
        ]);
        let selector = Selector::new(store, SelectorOptions::default());

        let first = selector.pick_random().unwrap();
        assert_eq!(first.system_id, "NES");
        assert_eq!(first.path, "/a.nes");
        assert_eq!(first.static_seconds, Some(12.5));
        assert_eq!(selector.pick_random().unwrap().path, "/b.nes");
        assert_eq!(selector.pick_random().unwrap().path, "/a.nes");
    }

    #[test]
    fn test_include_exclude_and_empty_lists() {
        let store = store_with(&[
            ("NES_gamelist.txt", &["/a.nes"]),
            ("GBA_gamelist.txt", &[]),
        ]);
        let selector = Selector::new(
            Arc::clone(&store),
            SelectorOptions {
                exclude: vec!["nes".to_string()],
                ..Default::default()
            },
        );
        assert!(selector.pick_random().is_none());

        let empty = Selector::new(Arc::new(CacheStore::new()), SelectorOptions::default());
        assert!(empty.pick_random().is_none());
    }

    #[test]
    fn test_history_boundaries() {
        let store = store_with(&[("NES_gamelist.txt", &["/a.nes", "/b.nes"])]);
        let selector = Selector::new(store, SelectorOptions::default());
        assert!(selector.back().is_none());

        selector.pick_random();
        selector.pick_random();
        assert_eq!(selector.current().as_deref(), Some("/b.nes"));
        assert!(selector.next().is_none());
        assert_eq!(selector.back().as_deref(), Some("/a.nes"));
        assert!(selector.back().is_none());
        assert_eq!(selector.current().as_deref(), Some("/a.nes"));
        assert_eq!(selector.next().as_deref(), Some("/b.nes"));
    }

    #[test]
    fn test_three_picks_then_back_to_start() {
        let store = store_with(&[("NES_gamelist.txt", &["/a.nes", "/b.nes", "/c.nes"])]);
        let selector = Selector::new(Arc::clone(&store), SelectorOptions::default());
        for _ in 0..3 {
            selector.pick_random();
        }
        assert_eq!(store.get_list(HISTORY_KEY), vec!["/a.nes", "/b.nes", "/c.nes"]);
        assert_eq!(selector.current().as_deref(), Some("/c.nes"));

        assert_eq!(selector.back().as_deref(), Some("/b.nes"));
        assert_eq!(selector.back().as_deref(), Some("/a.nes"));
        assert!(selector.back().is_none());
        assert_eq!(selector.current().as_deref(), Some("/a.nes"));
        assert_eq!(store.list_len(HISTORY_KEY), 3);
    }

    #[test]
    fn test_callback_fires_on_cursor_moves_only() {
        let store = store_with(&[("NES_gamelist.txt", &["/a.nes"])]);
        let moves = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&moves);
        let selector = Selector::new(store, SelectorOptions::default())
            .with_cursor_callback(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        selector.pick_random();
        selector.play("/search/hit.nes");
        selector.back();
        selector.back();
        selector.next();
        selector.next();
        assert_eq!(moves.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_reset_pools_allows_repeats() {
        let store = store_with(&[("NES_gamelist.txt", &["/a.nes", "/b.nes"])]);
        let selector = Selector::new(store, SelectorOptions::default());
        assert_eq!(selector.pick_random().unwrap().path, "/a.nes");
        selector.reset_pools();
        assert_eq!(selector.pick_random().unwrap().path, "/a.nes");
    }
}
