//! CLI command implementations for hdd-space-exporter.
//!
//! This module provides implementations for the operator subcommands:
//! - `check`: Configuration validation and one collection
//! - `config`: Configuration file generation
//! - `test`: Collection testing

pub mod check;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
