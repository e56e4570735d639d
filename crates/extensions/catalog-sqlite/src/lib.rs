//! SQLite job catalog for cronfleet.
//!
//! Serves per-job lookups inside read-then-rollback sessions, and answers
//! the bootstrap ownership query directly in SQL.

mod catalog;
mod schema;

pub use catalog::SqliteJobCatalog;
