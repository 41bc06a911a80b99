//! Category operations

use rusqlite::{params, OptionalExtension, Row};

use super::{classify, Database};
use crate::error::{Error, Result};
use crate::models::Category;

pub(crate) fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
    })
}

impl Database {
    /// List categories with the given lifecycle flag
    pub fn list_categories(&self, active: bool) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, is_active FROM categories WHERE is_active = ? ORDER BY name",
        )?;

        let categories = stmt
            .query_map(params![active], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Get a category by ID
    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, is_active FROM categories WHERE id = ?",
                params![id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Get a category by name, ignoring case
    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, is_active FROM categories WHERE name = ?",
                params![name],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Create a new, active category
    pub fn create_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("category name is required".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (name, is_active) VALUES (?, 1)",
            params![name],
        )
        .map_err(|e| classify(e, name))?;

        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            active: true,
        })
    }

    /// Rename a category and set its lifecycle flag
    pub fn update_category(&self, id: i64, name: &str, active: bool) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("category name is required".into()));
        }

        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE categories SET name = ?, is_active = ? WHERE id = ?",
                params![name, active, id],
            )
            .map_err(|e| classify(e, name))?;

        if updated == 0 {
            return Err(Error::NotFound(format!("category {}", id)));
        }

        Ok(Category {
            id,
            name: name.to_string(),
            active,
        })
    }

    /// Soft-delete a category
    pub fn disable_category(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE categories SET is_active = 0 WHERE id = ?",
            params![id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("category {}", id)));
        }
        Ok(())
    }
}
