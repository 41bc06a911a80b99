//! Persistence capabilities required by the ingestion pipeline

use crate::context::IngestContext;
use crate::error::Result;
use crate::models::{Category, Expense};

/// The narrow slice of the expense catalogue the pipeline depends on
///
/// `Database` is the production implementation. Lookups return `Ok(None)`
/// for a missing record and reserve `Err` for infrastructure failures.
pub trait ExpenseStore {
    /// Exact-match lookup of a catalogue expense by canonical title
    fn find_expense_by_title(&self, title: &str, ctx: &IngestContext)
        -> Result<Option<Expense>>;

    /// Case-insensitive lookup of a category by name
    fn find_category_by_name(&self, name: &str, ctx: &IngestContext)
        -> Result<Option<Category>>;

    /// Insert every title under `category_id` in one atomic unit
    ///
    /// Returns the assigned ids in input order. On any failure nothing is
    /// persisted; a duplicate title surfaces as `Error::Conflict`.
    fn insert_expenses_batch(
        &self,
        titles: &[&str],
        category_id: i64,
        ctx: &IngestContext,
    ) -> Result<Vec<i64>>;
}
