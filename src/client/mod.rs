//! Downstream API client
//!
//! - `retry`: bounded, status-driven retry with exponential backoff
//! - `import`: connectivity check, create-from-URL and search calls

mod import;
mod retry;

pub use import::{ImportClient, ImportError, ImportedItem, EXISTING_ITEM_NAME, UNKNOWN_ITEM_NAME};
pub use retry::{send_with_retry, RetryPolicy};
