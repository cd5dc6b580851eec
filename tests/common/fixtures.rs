//! Test data generation utilities and predefined scenarios
//!
//! Provides functions for creating libraries with specific folder layouts
//! so builder, selector and CLI tests start from the same trees.

#![allow(dead_code)]

use super::library::*;
use anyhow::Result;
use attract_library::core::config::Category;

/// Scenario: two consoles with an `.mgl` override and a zip pack
///
/// NES: Contra.nes, Metroid.nes + Metroid.mgl, Hacks/Mario.nes, Pack.zip/{Kirby,Zelda}.nes
/// SNES: Zelda.sfc, Mario Kart.sfc
pub fn create_console_library() -> Result<TestLibrary> {
    let mut library = setup_test_library()?;

    let nes = library.add_system("NES", Category::Console, &["nes"])?;
    create_games(
        &nes,
        &["Contra.nes", "Metroid.nes", "Metroid.mgl", "Hacks/Mario.nes"],
    )?;
    create_zip(&nes.join("Pack.zip"), &["Kirby.nes", "Zelda.nes", "manual.pdf"])?;

    let snes = library.add_system("SNES", Category::Console, &["sfc", "smc"])?;
    create_games(&snes, &["Zelda.sfc", "Mario Kart.sfc"])?;

    Ok(library)
}

/// Scenario: one system with whitelist, blacklist and staticlist files
///
/// GBA: Advance Wars, Golden Sun, Kuru Kuru, Tetris
/// whitelist keeps everything but Tetris, blacklist drops Kuru Kuru,
/// staticlist marks Golden Sun at 12.5 seconds
pub fn create_curated_library() -> Result<TestLibrary> {
    let mut library = setup_test_library()?;

    let gba = library.add_system("GBA", Category::Handheld, &["gba"])?;
    create_games(
        &gba,
        &[
            "Advance Wars.gba",
            "Golden Sun.gba",
            "Kuru Kuru.gba",
            "Tetris.gba",
        ],
    )?;

    write_curation(
        &library,
        "GBA",
        "whitelist",
        &["Advance Wars", "Golden Sun.gba", "Kuru Kuru"],
    )?;
    write_curation(&library, "GBA", "blacklist", &["kuru kuru"])?;
    write_curation(&library, "GBA", "staticlist", &["<12.5> Golden Sun"])?;

    Ok(library)
}
