//! Output module for reporting on the state database
//!
//! This module handles printing store-wide statistics and recent run
//! history for the `--stats` command.

pub mod stats;

pub use stats::{format_statistics, load_statistics, print_statistics, SyncStatistics};
