use crate::core::{
    builder::{BuildOptions, BuildReport, SystemState},
    context::LibraryContext,
    error::{LibraryError, Result},
    output::print_system_status,
    print_info, print_section_header, print_success,
};
use colored::*;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub fn execute_build(
    config_path: Option<&Path>,
    overwrite: bool,
    systems: Vec<String>,
) -> Result<()> {
    let context = LibraryContext::initialize(config_path)?;

    let systems: Vec<String> = systems
        .iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let options = BuildOptions {
        overwrite,
        systems: (!systems.is_empty()).then_some(systems),
        cancel: Arc::new(AtomicBool::new(false)),
    };

    let report = context.builder().build(&options)?;
    print_report(&report);

    if report.total_games == 0 {
        return Err(LibraryError::NoGamesIndexed);
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    print_section_header("Systems");

    let id_width = report
        .systems
        .iter()
        .map(|system| system.system_id.len())
        .max()
        .unwrap_or(0);
    for system in &report.systems {
        print_system_status(system, id_width);
    }

    let totals = report.totals();
    if !totals.is_empty() {
        println!("\n  {}", totals.to_string().bright_black());
    }

    if report.cancelled {
        print_info("Build cancelled. Masterlist, GameIndex and ledger were left untouched.");
        return;
    }

    print_success(&format!(
        "{} games indexed ({} fresh, {} reused, {} empty, {} failed)",
        report.total_games,
        report.count(SystemState::Fresh),
        report.count(SystemState::Reused),
        report.count(SystemState::Empty),
        report.count(SystemState::Failed),
    ));
    if !report.artifacts_written {
        println!("  {}", "Nothing changed on disk".bright_black());
    }
    println!();
}
