use crate::core::{
    context::LibraryContext,
    error::Result,
    print_info, print_section_header,
    search::{load_index, search},
};
use colored::*;
use std::path::Path;

pub fn execute_search(config_path: Option<&Path>, query: &str) -> Result<()> {
    let context = LibraryContext::initialize(config_path)?;
    context.load_cache()?;

    let index = load_index(&context.store);
    log::debug!("GameIndex loaded: {} entries", index.len());

    let results = search(&index, query);
    if results.is_empty() {
        print_info(&format!("No matches for \"{query}\""));
        return Ok(());
    }

    print_section_header(&format!("{} matches", results.len()));
    let id_width = results.iter().map(|e| e.system_id.len()).max().unwrap_or(0);
    for entry in &results {
        println!(
            "  {:<width$}  {}  {}",
            entry.system_id.blue(),
            entry.name.white(),
            entry.menu_path.bright_black(),
            width = id_width
        );
    }
    println!();
    Ok(())
}
