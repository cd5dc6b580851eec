//! Consolidated test utilities for attract-library
//!
//! This module provides unified testing utilities for integration tests,
//! built around fake game library trees in temporary directories.

pub mod assertions;
pub mod fixtures;
pub mod library;
