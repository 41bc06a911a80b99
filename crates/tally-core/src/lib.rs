//! Tally Core Library
//!
//! Shared functionality for the Tally statement reconciliation service:
//! - CSV statement parsing and title normalization
//! - Aggregation of repeated charges into one expense per title
//! - Reconciliation against the persisted expense catalogue
//! - Atomic batch insertion of new expenses under a fallback category
//! - SQLite storage with connection pooling and migrations

pub mod context;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod store;
pub mod summary;

/// In-memory store for exercising the pipeline without SQLite
#[cfg(test)]
pub mod test_utils;

pub use context::{CancelHandle, IngestContext};
pub use db::Database;
pub use error::{Error, Result};
pub use import::{aggregate, aggregate_statement, merge, RawRow, StatementReader};
pub use models::{Category, Expense, ExpenseMap};
pub use normalize::{normalize_title, TitleRules};
pub use reconcile::{
    ingest_statement, insert_new, reconcile, IngestOptions, IngestOutcome, Reconciled,
    DEFAULT_CATEGORY,
};
pub use store::ExpenseStore;
