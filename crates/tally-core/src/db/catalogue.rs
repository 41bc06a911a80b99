//! `ExpenseStore` backed by SQLite
//!
//! Every statement runs on a connection whose busy timeout is the time left
//! before the ingestion deadline, so lock waits end with `Error::Timeout`.

use rusqlite::{params, OptionalExtension, TransactionBehavior};

use super::categories::row_to_category;
use super::expenses::{row_to_expense, EXPENSE_COLUMNS};
use super::{classify, Database};
use crate::context::IngestContext;
use crate::error::Result;
use crate::models::{Category, Expense};
use crate::store::ExpenseStore;

impl ExpenseStore for Database {
    fn find_expense_by_title(&self, title: &str, ctx: &IngestContext) -> Result<Option<Expense>> {
        let conn = self.bounded_conn(ctx)?;
        conn.query_row(
            &format!("{} WHERE e.title = ?", EXPENSE_COLUMNS),
            params![title],
            row_to_expense,
        )
        .optional()
        .map_err(|e| classify(e, title))
    }

    fn find_category_by_name(
        &self,
        name: &str,
        ctx: &IngestContext,
    ) -> Result<Option<Category>> {
        let conn = self.bounded_conn(ctx)?;
        conn.query_row(
            "SELECT id, name, is_active FROM categories WHERE name = ?",
            params![name],
            row_to_category,
        )
        .optional()
        .map_err(|e| classify(e, name))
    }

    fn insert_expenses_batch(
        &self,
        titles: &[&str],
        category_id: i64,
        ctx: &IngestContext,
    ) -> Result<Vec<i64>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.bounded_conn(ctx)?;

        // IMMEDIATE takes the write lock up front; concurrent batches wait up
        // to the busy timeout. Dropping `tx` without commit rolls back.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| classify(e, titles[0]))?;

        let mut ids = Vec::with_capacity(titles.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO expenses (title, category_id, is_active) VALUES (?, ?, 1) RETURNING id",
            )?;
            for &title in titles {
                ctx.checkpoint("batch insert")?;
                let id: i64 = stmt
                    .query_row(params![title, category_id], |row| row.get(0))
                    .map_err(|e| classify(e, title))?;
                ids.push(id);
            }
        }

        ctx.checkpoint("batch commit")?;
        tx.commit().map_err(|e| classify(e, titles[0]))?;

        Ok(ids)
    }
}
