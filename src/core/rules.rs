//! Parsing and matching of disable rules.
//!
//! This module provides [`DisableRule`] which turns the human-friendly glob
//! strings of the `disable` config section into a tagged variant once, at
//! configuration-load time, and [`CompiledRules`] which merges the global
//! (`"all"`) and per-system rule sets used by the structural filter stage.
//!
//! # Supported Forms
//! - **Contains**: `*demo*`
//! - **Prefix**: `beta*`
//! - **Suffix**: `*(proto)`
//! - **Exact**: `bios` (compared without extension when the rule has no dot)
//!
//! Matching is case-insensitive and ignores surrounding whitespace.

use crate::core::config::DisableRules;
use crate::core::error::{LibraryError, Result};
use crate::core::state::split_name_ext;
use std::collections::{BTreeMap, HashSet};

/// Key of the rule set applied to every system
pub const GLOBAL_RULES_KEY: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableRule {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl DisableRule {
    pub fn parse(input: &str) -> Result<Self> {
        let rule = input.trim().to_lowercase();
        if rule.is_empty() {
            return Err(LibraryError::invalid_rule(input));
        }

        let leading = rule.starts_with('*');
        let trailing = rule.ends_with('*');
        let core = rule.trim_matches('*');

        if core.is_empty() || core.contains('*') {
            return Err(LibraryError::invalid_rule(input));
        }
        // "**x" / "x**" are ambiguous
        let stars = rule.len() - core.len();
        if stars > usize::from(leading) + usize::from(trailing) {
            return Err(LibraryError::invalid_rule(input));
        }

        let core = core.to_string();
        Ok(match (leading, trailing) {
            (true, true) => DisableRule::Contains(core),
            (false, true) => DisableRule::Prefix(core),
            (true, false) => DisableRule::Suffix(core),
            (false, false) => DisableRule::Exact(core),
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return false;
        }
        match self {
            DisableRule::Contains(sub) => candidate.contains(sub.as_str()),
            DisableRule::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
            DisableRule::Suffix(suffix) => candidate.ends_with(suffix.as_str()),
            DisableRule::Exact(exact) => {
                if exact.contains('.') {
                    candidate == *exact
                } else {
                    split_name_ext(&candidate).0 == exact
                }
            }
        }
    }
}

/// Normalize an extension rule: lowercase, no leading dot
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Global and per-system disable rules for one system, compiled once
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub folders: Vec<DisableRule>,
    pub files: Vec<DisableRule>,
    pub extensions: HashSet<String>,
}

impl CompiledRules {
    /// Merge the global rule set with the one for `system_id` (case-insensitive key)
    pub fn compile(disable: &BTreeMap<String, DisableRules>, system_id: &str) -> Result<Self> {
        let mut compiled = CompiledRules::default();
        for (key, rules) in disable {
            let applies = key.eq_ignore_ascii_case(GLOBAL_RULES_KEY)
                || key.eq_ignore_ascii_case(system_id);
            if !applies {
                continue;
            }
            for folder in &rules.folders {
                compiled.folders.push(DisableRule::parse(folder)?);
            }
            for file in &rules.files {
                compiled.files.push(DisableRule::parse(file)?);
            }
            for ext in &rules.extensions {
                let ext = normalize_extension(ext);
                if ext.is_empty() {
                    return Err(LibraryError::invalid_rule(ext));
                }
                compiled.extensions.insert(ext);
            }
        }
        Ok(compiled)
    }

    /// Check every rule set for syntax errors without keeping the result
    pub fn validate_all(disable: &BTreeMap<String, DisableRules>) -> Result<()> {
        for key in disable.keys() {
            Self::compile(disable, key)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty() && self.extensions.is_empty()
    }

    pub fn folder_disabled(&self, segment: &str) -> Option<&DisableRule> {
        self.folders.iter().find(|rule| rule.matches(segment))
    }

    pub fn file_disabled(&self, file_name: &str) -> Option<&DisableRule> {
        self.files.iter().find(|rule| rule.matches(file_name))
    }

    pub fn extension_disabled(&self, ext: &str) -> bool {
        !ext.is_empty() && self.extensions.contains(&ext.to_lowercase())
    }
}
