//! Persistent JSON configuration.
//!
//! [`LibraryConfig`] is stored as `config.json` in the platform config
//! directory. A default file, describing a typical MiSTer-style layout, is
//! written the first time the tool runs.

use crate::core::dirs::{
    default_filterlist_directory, default_gamelist_directory, get_config_directory,
};
use crate::core::error::{LibraryError, Result};
use crate::core::rules::{normalize_extension, CompiledRules};
use crate::core::scanner::{MGL_EXTENSION, ZIP_EXTENSION};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Platform category used by group names in include/exclude lists
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Console,
    Handheld,
    Arcade,
    Computer,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Console,
        Category::Handheld,
        Category::Arcade,
        Category::Computer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Console => "Console",
            Category::Handheld => "Handheld",
            Category::Arcade => "Arcade",
            Category::Computer => "Computer",
        }
    }

    pub fn from_group(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SystemDef {
    pub id: String,
    pub name: String,
    pub category: Category,
    /// Root folders scanned for this system
    pub folders: Vec<PathBuf>,
    /// Valid extensions, with or without a leading dot
    pub extensions: Vec<String>,
}

impl SystemDef {
    pub fn new(
        id: &str,
        name: &str,
        category: Category,
        folders: &[&str],
        extensions: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            folders: folders.iter().map(PathBuf::from).collect(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    /// Lowercase extensions a game of this system can carry. `.mgl` is always
    /// included; `.zip` never is, archives are containers.
    pub fn game_extensions(&self) -> HashSet<String> {
        let mut extensions: HashSet<String> = self
            .extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| !ext.is_empty() && ext != ZIP_EXTENSION)
            .collect();
        extensions.insert(MGL_EXTENSION.to_string());
        extensions
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DisableRules {
    pub folders: Vec<String>,
    pub files: Vec<String>,
    pub extensions: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ListConfig {
    /// Systems that get no curation at all
    pub exclude: Vec<String>,

    pub use_whitelist: bool,
    pub whitelist_include: Vec<String>,
    pub whitelist_exclude: Vec<String>,

    pub use_blacklist: bool,
    pub blacklist_include: Vec<String>,
    pub blacklist_exclude: Vec<String>,

    pub use_staticlist: bool,
    pub staticlist_include: Vec<String>,
    pub staticlist_exclude: Vec<String>,

    /// Keep every artifact in memory and never write to disk
    pub ram_only: bool,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            use_whitelist: true,
            whitelist_include: Vec::new(),
            whitelist_exclude: Vec::new(),
            use_blacklist: true,
            blacklist_include: Vec::new(),
            blacklist_exclude: Vec::new(),
            use_staticlist: true,
            staticlist_include: Vec::new(),
            staticlist_exclude: Vec::new(),
            ram_only: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AttractConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Pick randomly instead of walking the lists in order
    pub random: bool,
}

impl Default for AttractConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            random: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LibraryConfig {
    pub gamelist_dir: PathBuf,
    pub filterlist_dir: PathBuf,
    pub systems: Vec<SystemDef>,
    #[serde(default)]
    pub disable: BTreeMap<String, DisableRules>,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub attract: AttractConfig,
}

impl LibraryConfig {
    /// Configuration rooted at explicit directories with the default catalog
    pub fn with_dirs(gamelist_dir: impl Into<PathBuf>, filterlist_dir: impl Into<PathBuf>) -> Self {
        Self {
            gamelist_dir: gamelist_dir.into(),
            filterlist_dir: filterlist_dir.into(),
            systems: default_systems(),
            disable: default_disable_rules(),
            list: ListConfig::default(),
            attract: AttractConfig::default(),
        }
    }

    pub fn load_or_create() -> Result<Self> {
        let config_file = get_config_directory()?.join(CONFIG_FILE_NAME);

        if config_file.exists() {
            Self::load_from(&config_file)
        } else {
            let config = Self::with_dirs(
                default_gamelist_directory()?,
                default_filterlist_directory()?,
            );
            config.save_to(&config_file)?;
            log::info!("Created default config at {}", config_file.display());
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LibraryError::read_failed(path, e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LibraryError::config_parse_failed(path, e))?;
        config.validate()?;
        log::debug!(
            "Loaded config from {} with {} systems",
            path.display(),
            config.systems.len()
        );
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LibraryError::directory_creation_failed(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| LibraryError::write_failed(path, e))?;
        Ok(())
    }

    /// Reject configuration errors before any cache or disk write happens
    pub fn validate(&self) -> Result<()> {
        if self.systems.is_empty() {
            return Err(LibraryError::NoSystemsConfigured);
        }
        CompiledRules::validate_all(&self.disable)
    }
}

fn default_systems() -> Vec<SystemDef> {
    use Category::*;
    vec![
        SystemDef::new(
            "NES",
            "Nintendo Entertainment System",
            Console,
            &["/media/fat/games/NES"],
            &["nes", "fds"],
        ),
        SystemDef::new(
            "SNES",
            "Super Nintendo",
            Console,
            &["/media/fat/games/SNES"],
            &["sfc", "smc"],
        ),
        SystemDef::new(
            "Genesis",
            "Sega Genesis",
            Console,
            &["/media/fat/games/Genesis", "/media/fat/games/MegaDrive"],
            &["md", "gen", "bin"],
        ),
        SystemDef::new(
            "PSX",
            "Sony PlayStation",
            Console,
            &["/media/fat/games/PSX"],
            &["cue", "chd"],
        ),
        SystemDef::new("GBA", "Game Boy Advance", Handheld, &["/media/fat/games/GBA"], &["gba"]),
        SystemDef::new("GB", "Game Boy", Handheld, &["/media/fat/games/GAMEBOY"], &["gb"]),
        SystemDef::new("Arcade", "Arcade", Arcade, &["/media/fat/_Arcade"], &["mra"]),
        SystemDef::new("Amiga", "Commodore Amiga", Computer, &["/media/fat/games/Amiga"], &["adf"]),
    ]
}

fn default_disable_rules() -> BTreeMap<String, DisableRules> {
    let mut disable = BTreeMap::new();
    disable.insert(
        "all".to_string(),
        DisableRules {
            folders: vec!["*bios*".to_string()],
            files: vec!["*(beta)*".to_string(), "*(proto)*".to_string()],
            extensions: Vec::new(),
        },
    );
    disable
}
