//! Title search over the GameIndex.
//!
//! Results come in three groups, each sorted by path: names starting with the
//! query, names containing it, and names within a small edit distance.

use crate::core::cache_store::{CacheStore, GAME_INDEX_KEY};
use crate::core::persistence::parse_game_index;
use crate::core::state::{split_name_ext, GameEntry};

/// Largest edit distance still counted as a fuzzy match
pub const MAX_DISTANCE: usize = 3;
pub const MAX_RESULTS: usize = 200;

/// Parse the cached GameIndex
pub fn load_index(store: &CacheStore) -> Vec<GameEntry> {
    parse_game_index(&store.get_list(GAME_INDEX_KEY))
}

/// Split a query into its normalized name and an optional extension filter
fn parse_query(query: &str) -> (String, Option<String>) {
    let trimmed = query.trim();
    let (name, ext) = split_name_ext(trimmed);
    let is_ext = !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    if is_ext {
        (name.trim().to_lowercase(), Some(ext.to_ascii_lowercase()))
    } else {
        (trimmed.to_lowercase(), None)
    }
}

pub fn search(entries: &[GameEntry], query: &str) -> Vec<GameEntry> {
    let (needle, ext) = parse_query(query);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut prefix = Vec::new();
    let mut substring = Vec::new();
    let mut fuzzy = Vec::new();

    for entry in entries {
        if let Some(ext) = &ext {
            if entry.ext != *ext {
                continue;
            }
        }
        let name = entry.name.trim().to_lowercase();
        if name.starts_with(&needle) {
            prefix.push(entry.clone());
        } else if name.contains(&needle) {
            substring.push(entry.clone());
        } else if levenshtein(&needle, &name) <= MAX_DISTANCE {
            fuzzy.push(entry.clone());
        }
    }

    for group in [&mut prefix, &mut substring, &mut fuzzy] {
        group.sort_by(|a, b| a.path.cmp(&b.path));
    }

    let mut results = prefix;
    results.extend(substring);
    results.extend(fuzzy);
    results.truncate(MAX_RESULTS);
    log::debug!("Search {query:?}: {} matches", results.len());
    results
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
