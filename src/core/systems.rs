//! System catalog and include/exclude resolution.
//!
//! Include and exclude lists may name systems directly (case-insensitive) or
//! use one of the group names `Console`, `Handheld`, `Arcade` and `Computer`,
//! which expand to every catalog system of that category.

use crate::core::config::{Category, SystemDef};
use crate::core::error::{LibraryError, Result};

#[derive(Debug, Clone, Default)]
pub struct SystemCatalog {
    systems: Vec<SystemDef>,
}

impl SystemCatalog {
    pub fn new(systems: Vec<SystemDef>) -> Self {
        Self { systems }
    }

    /// Systems in catalog order
    pub fn systems(&self) -> &[SystemDef] {
        &self.systems
    }

    pub fn ids(&self) -> Vec<String> {
        self.systems.iter().map(|system| system.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn lookup(&self, id: &str) -> Option<&SystemDef> {
        let id = id.trim();
        self.systems
            .iter()
            .find(|system| system.id.eq_ignore_ascii_case(id))
    }

    pub fn by_category(&self, category: Category) -> Vec<String> {
        self.systems
            .iter()
            .filter(|system| system.category == category)
            .map(|system| system.id.clone())
            .collect()
    }

    /// Replace group names with their member ids and known ids with their
    /// canonical spelling. Unknown names pass through unchanged.
    pub fn expand_groups(&self, names: &[String]) -> Result<Vec<String>> {
        let mut expanded = Vec::new();
        for name in names {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(category) = Category::from_group(trimmed) {
                let members = self.by_category(category);
                // "Arcade" is both a group and a system id in the default catalog
                if members.is_empty() && self.lookup(trimmed).is_none() {
                    return Err(LibraryError::unknown_group(trimmed));
                }
                expanded.extend(members);
                continue;
            }

            match self.lookup(trimmed) {
                Some(system) => expanded.push(system.id.clone()),
                None => expanded.push(trimmed.to_string()),
            }
        }
        Ok(expanded)
    }

    /// Resolve a list of system names into catalog systems, in catalog order
    pub fn select(&self, names: &[String]) -> Result<Vec<&SystemDef>> {
        let wanted = self.expand_groups(names)?;
        for name in &wanted {
            if self.lookup(name).is_none() {
                return Err(LibraryError::unknown_system(name.as_str()));
            }
        }
        Ok(self
            .systems
            .iter()
            .filter(|system| contains_insensitive(&wanted, &system.id))
            .collect())
    }

    /// Include/exclude check with group expansion
    pub fn allowed_for(&self, system_id: &str, include: &[String], exclude: &[String]) -> Result<bool> {
        let include = self.expand_groups(include)?;
        let exclude = self.expand_groups(exclude)?;
        Ok(allowed_for(system_id, &include, &exclude))
    }
}

/// Include/exclude check on already-expanded lists. An empty include list
/// allows everything.
pub fn allowed_for(system_id: &str, include: &[String], exclude: &[String]) -> bool {
    if !include.is_empty() && !contains_insensitive(include, system_id) {
        return false;
    }
    !contains_insensitive(exclude, system_id)
}

pub fn contains_insensitive(list: &[String], item: &str) -> bool {
    let item = item.trim();
    list.iter().any(|entry| entry.trim().eq_ignore_ascii_case(item))
}
