//! Unified output formatting utilities for consistent CLI presentation.
//!
//! # Design Principles
//! - **Consistent color scheme**: Red for errors, green for success, bright_black for detail
//! - **Standardized spacing**: Newline before and after all command outputs
//! - **Aligned tables**: Per-system rows line up regardless of id length

use crate::core::builder::{SystemReport, SystemState};
use colored::*;

/// Formats and prints an error message with consistent styling
///
/// # Format
/// ```text
///
/// ✕ Error: <message>
///
/// ```
pub fn print_error(message: &str) {
    println!("\n{} {}\n", "✕ Error:".red(), message.white());
}

/// Formats and prints a success message with consistent styling
pub fn print_success(message: &str) {
    println!("\n{} {}", "✓".green(), message.white());
}

pub fn print_info(message: &str) {
    println!("\n{}\n", message.white());
}

/// Formats and prints a section header with consistent styling
///
/// # Format
/// ```text
///
/// <header>:
///
/// ```
pub fn print_section_header(header: &str) {
    println!("\n{}:\n", header.white());
}

fn state_label(state: SystemState) -> ColoredString {
    let label = format!("{state:<9}");
    match state {
        SystemState::Fresh => label.green(),
        SystemState::Reused => label.blue(),
        SystemState::Empty => label.yellow(),
        SystemState::Failed => label.red(),
        SystemState::Cancelled => label.bright_black(),
    }
}

/// Render one build status row without printing it
pub fn format_system_status(report: &SystemReport, id_width: usize) -> String {
    let mut line = format!(
        "  {:<width$}  {}  {:>6} on disk  {:>6} in cache",
        report.system_id,
        state_label(report.state),
        report.disk_count,
        report.cache_count,
        width = id_width
    );
    if !report.counts.is_empty() {
        line.push_str(&format!("  {}", report.counts.to_string().bright_black()));
    }
    if let Some(error) = &report.error {
        line.push_str(&format!("  {}", error.bright_black()));
    }
    line
}

pub fn print_system_status(report: &SystemReport, id_width: usize) {
    println!("{}", format_system_status(report, id_width));
}

/// `<key>  <count>` row used by the lists command
pub fn print_key_count(key: &str, count: usize, key_width: usize) {
    println!(
        "  {:<width$}  {}",
        key.white(),
        count.to_string().bright_black(),
        width = key_width
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::FilterCounts;

    fn report(state: SystemState) -> SystemReport {
        SystemReport {
            system_id: "NES".to_string(),
            state,
            disk_count: 120,
            cache_count: 118,
            counts: FilterCounts {
                black: 2,
                ..Default::default()
            },
            error: None,
        }
    }

    #[test]
    fn test_print_functions_do_not_panic() {
        print_error("Test error message");
        print_success("Operation completed");
        print_info("Information message");
        print_section_header("Systems");
        print_key_count("NES_gamelist.txt", 3, 20);
    }

    #[test]
    fn test_format_system_status() {
        colored::control::set_override(false);
        let line = format_system_status(&report(SystemState::Fresh), 6);
        assert!(line.starts_with("  NES     FRESH"));
        assert!(line.contains("120 on disk"));
        assert!(line.contains("118 in cache"));
        assert!(line.contains("Black:2"));
    }

    #[test]
    fn test_format_failed_status_shows_error() {
        colored::control::set_override(false);
        let mut failed = report(SystemState::Failed);
        failed.error = Some("No usable roots for system NES".to_string());
        let line = format_system_status(&failed, 3);
        assert!(line.contains("FAILED"));
        assert!(line.ends_with("No usable roots for system NES"));
    }
}
