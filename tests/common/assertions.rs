//! Common assertion helpers for test output validation
//!
//! Provides predicates for validating attract-library command output and
//! error messages.

#![allow(dead_code)]

use predicates::prelude::*;

/// Creates a predicate that checks for the red error prefix
pub fn is_error() -> impl Predicate<str> {
    predicates::str::contains("Error:")
}

/// Creates a predicate that checks for the missing-gamelists hint
pub fn no_gamelists() -> impl Predicate<str> {
    predicates::str::contains("No gamelists available")
}

/// Creates a predicate that checks a system status row
pub fn has_system_state(system_id: &str, state: &str) -> impl Predicate<str> {
    predicates::str::is_match(format!(r"\b{system_id}\s+{state}")).expect("valid regex")
}

/// Creates a predicate that checks the build summary line
pub fn has_games_indexed(count: usize) -> impl Predicate<str> {
    predicates::str::contains(format!("{count} games indexed"))
}
