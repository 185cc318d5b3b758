//! Integration test crate for the Folio catalog core.
//!
//! This crate has no library code. It only contains integration tests that
//! drive the feed, workspace and label components against a real SQLite
//! database.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p folio-integration-tests
//! ```
