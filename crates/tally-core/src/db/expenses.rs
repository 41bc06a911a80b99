//! Expense catalogue operations
//!
//! Catalogue rows carry no amount; `value` is always zero on expenses read here.

use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{classify, Database};
use crate::error::{Error, Result};
use crate::models::Expense;

pub(crate) const EXPENSE_COLUMNS: &str = "SELECT e.id, e.title, e.category_id, c.name, e.is_active \
     FROM expenses e LEFT JOIN categories c ON c.id = e.category_id";

pub(crate) fn row_to_expense(row: &Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        title: row.get(1)?,
        category_id: row.get(2)?,
        category: row.get(3)?,
        value: Decimal::ZERO,
        active: row.get(4)?,
    })
}

impl Database {
    /// List expenses with the given lifecycle flag, with category names
    pub fn list_expenses(&self, active: bool) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE e.is_active = ? ORDER BY e.title",
            EXPENSE_COLUMNS
        ))?;

        let expenses = stmt
            .query_map(params![active], row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Get an expense by ID
    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!("{} WHERE e.id = ?", EXPENSE_COLUMNS),
                params![id],
                row_to_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// Create a catalogue expense
    pub fn create_expense(&self, title: &str, category_id: Option<i64>) -> Result<Expense> {
        if title.is_empty() {
            return Err(Error::InvalidData("expense title is required".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO expenses (title, category_id, is_active) VALUES (?, ?, 1)",
            params![title, category_id],
        )
        .map_err(|e| classify(e, title))?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_expense(id)?
            .ok_or_else(|| Error::NotFound(format!("expense {}", id)))
    }

    /// Update title, category and lifecycle flag of an expense
    pub fn update_expense(
        &self,
        id: i64,
        title: &str,
        category_id: Option<i64>,
        active: bool,
    ) -> Result<Expense> {
        if title.is_empty() {
            return Err(Error::InvalidData("expense title is required".into()));
        }

        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE expenses SET title = ?, category_id = ?, is_active = ? WHERE id = ?",
                params![title, category_id, active, id],
            )
            .map_err(|e| classify(e, title))?;
        drop(conn);

        if updated == 0 {
            return Err(Error::NotFound(format!("expense {}", id)));
        }

        self.get_expense(id)?
            .ok_or_else(|| Error::NotFound(format!("expense {}", id)))
    }

    /// Soft-delete an expense
    pub fn disable_expense(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE expenses SET is_active = 0 WHERE id = ?",
            params![id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("expense {}", id)));
        }
        Ok(())
    }
}
