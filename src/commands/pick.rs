use crate::core::{
    context::LibraryContext,
    error::{LibraryError, Result},
    print_section_header,
};
use colored::*;
use std::path::Path;

pub fn execute_pick(config_path: Option<&Path>, count: usize) -> Result<()> {
    let context = LibraryContext::initialize(config_path)?;
    let keys = context.load_cache()?;
    log::debug!("Loaded {keys} cache keys for picking");

    let selector = context.selector()?;

    let mut picks = Vec::with_capacity(count);
    for _ in 0..count.max(1) {
        match selector.pick_random() {
            Some(pick) => picks.push(pick),
            None => break,
        }
    }
    if picks.is_empty() {
        return Err(LibraryError::NoGamesIndexed);
    }

    print_section_header("Picked");
    let id_width = picks.iter().map(|p| p.system_id.len()).max().unwrap_or(0);
    for (i, pick) in picks.iter().enumerate() {
        let timing = pick
            .static_seconds
            .map(|seconds| format!(" (static after {seconds}s)"))
            .unwrap_or_default();
        println!(
            "{}{}{} {:<width$}  {}{}",
            "[".bright_black(),
            (i + 1).to_string().white(),
            "]".bright_black(),
            pick.system_id.blue(),
            pick.path.white(),
            timing.bright_black(),
            width = id_width
        );
    }
    println!();
    Ok(())
}
