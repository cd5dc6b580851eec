//! The three-stage filter pipeline applied to every system's file list.
//!
//! Stages always run in the order A, B, C:
//! - **A** ([`stage_a`]): structural disable rules on folders, files, extensions
//! - **B** ([`stage_b`]): one entry per base name, `.mgl` preferred
//! - **C** ([`stage_c`]): whitelist, blacklist, then staticlist annotations
//!
//! Every stage returns its survivors together with the [`FilterCounts`] it
//! produced.

use crate::core::config::{ListConfig, SystemDef};
use crate::core::curation::{normalize_name, CurationSet};
use crate::core::error::Result;
use crate::core::rules::CompiledRules;
use crate::core::scanner::MGL_EXTENSION;
use crate::core::state::{file_name, split_name_ext, FilterCounts, GamelistLine};
use crate::core::systems::{contains_insensitive, SystemCatalog};
use std::collections::HashMap;
use std::path::Path;

/// Structural filters: folder, file and extension disable rules
pub fn stage_a(paths: &[String], rules: &CompiledRules) -> (Vec<String>, FilterCounts) {
    let mut counts = FilterCounts::default();
    if rules.is_empty() {
        return (paths.to_vec(), counts);
    }

    let mut kept = Vec::with_capacity(paths.len());
    for path in paths {
        let bare = GamelistLine::parse(path);
        let segments: Vec<&str> = bare.path().split('/').collect();
        let (parents, name) = match segments.split_last() {
            Some((name, parents)) => (parents, *name),
            None => continue,
        };

        if let Some(rule) = parents
            .iter()
            .filter(|segment| !segment.is_empty())
            .find_map(|segment| rules.folder_disabled(segment))
        {
            log::debug!("Folder rule {rule:?} removed {path}");
            counts.folder += 1;
            continue;
        }

        if let Some(rule) = rules.file_disabled(name) {
            log::debug!("File rule {rule:?} removed {path}");
            counts.file += 1;
            continue;
        }

        let (_, ext) = split_name_ext(name);
        if rules.extension_disabled(ext) {
            log::debug!("Extension rule .{ext} removed {path}");
            counts.file += 1;
            continue;
        }

        kept.push(path.clone());
    }
    (kept, counts)
}

/// Keep one line per lowercased base name: the first `.mgl`, else the first seen
pub fn stage_b(lines: &[String]) -> (Vec<String>, FilterCounts) {
    let mut counts = FilterCounts::default();
    let mut order: Vec<String> = Vec::new();
    let mut chosen: HashMap<String, (usize, bool)> = HashMap::new();

    for (idx, line) in lines.iter().enumerate() {
        let bare = GamelistLine::parse(line);
        let (base, ext) = split_name_ext(file_name(bare.path()));
        let key = base.to_lowercase();
        let is_mgl = ext.eq_ignore_ascii_case(MGL_EXTENSION);

        match chosen.get_mut(&key) {
            None => {
                chosen.insert(key.clone(), (idx, is_mgl));
                order.push(key);
            }
            Some(existing) => {
                counts.file += 1;
                if is_mgl && !existing.1 {
                    *existing = (idx, true);
                }
            }
        }
    }

    let kept = order
        .iter()
        .filter_map(|key| chosen.get(key))
        .map(|(idx, _)| lines[*idx].clone())
        .collect();
    (kept, counts)
}

/// Apply the curation lists allowed for `system_id`
pub fn stage_c(
    system_id: &str,
    lines: &[String],
    curation: &CurationSet,
    list: &ListConfig,
    catalog: &SystemCatalog,
) -> Result<(Vec<String>, FilterCounts)> {
    let mut counts = FilterCounts::default();
    let mut current = lines.to_vec();

    if contains_insensitive(&catalog.expand_groups(&list.exclude)?, system_id) {
        log::debug!("{system_id}: curation disabled for this system");
        return Ok((current, counts));
    }

    let extensions = catalog
        .lookup(system_id)
        .map(SystemDef::game_extensions)
        .unwrap_or_default();
    let curation = curation.resolve(&extensions);
    let name_of = |line: &String| normalize_name(line, &extensions);

    if list.use_whitelist
        && catalog.allowed_for(system_id, &list.whitelist_include, &list.whitelist_exclude)?
    {
        if let Some(whitelist) = &curation.whitelist {
            let before = current.len();
            current.retain(|line| whitelist.contains(&name_of(line)));
            counts.white = before - current.len();
        }
    }

    if list.use_blacklist
        && catalog.allowed_for(system_id, &list.blacklist_include, &list.blacklist_exclude)?
    {
        if let Some(blacklist) = &curation.blacklist {
            let before = current.len();
            current.retain(|line| !blacklist.contains(&name_of(line)));
            counts.black = before - current.len();
        }
    }

    if list.use_staticlist
        && catalog.allowed_for(system_id, &list.staticlist_include, &list.staticlist_exclude)?
    {
        if let Some(staticlist) = &curation.staticlist {
            for line in current.iter_mut() {
                let Some(seconds) = staticlist.get(&name_of(&*line)) else {
                    continue;
                };
                if let Some(annotated) = GamelistLine::parse(line).with_static(seconds) {
                    *line = annotated.to_string();
                    counts.static_ += 1;
                }
            }
        }
    }

    if !counts.is_empty() {
        log::debug!("{system_id}: curation {counts}");
    }
    Ok((current, counts))
}

/// Load the curation lists of `system_id` from `filterlist_dir` and run
/// [`stage_c`]. Unreadable lists are ignored with a warning.
pub fn curate_lines(
    system_id: &str,
    lines: &[String],
    filterlist_dir: &Path,
    list: &ListConfig,
    catalog: &SystemCatalog,
) -> Result<(Vec<String>, FilterCounts)> {
    let curation = CurationSet::load(filterlist_dir, system_id).unwrap_or_else(|e| {
        log::warn!("{system_id}: ignoring curation lists: {e}");
        CurationSet::default()
    });
    stage_c(system_id, lines, &curation, list, catalog)
}
