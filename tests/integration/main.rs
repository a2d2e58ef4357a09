//! Integration tests for Sumi-Sync
//!
//! These tests use wiremock to stand in for the downstream API, feeds and
//! index pages, and exercise discovery, import and full sync cycles.

mod import_tests;
mod sync_tests;
