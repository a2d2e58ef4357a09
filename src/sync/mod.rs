//! Sync orchestration
//!
//! This module ties discovery, the state store and the import client
//! together into runs, and runs into a periodic loop.

mod coordinator;
mod select;

pub use coordinator::{Coordinator, SyncReport};
pub use select::{dedupe_preserving_order, select_candidates};
