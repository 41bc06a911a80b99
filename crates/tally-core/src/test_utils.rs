//! Test utilities for tally-core
//!
//! `MemoryStore` is an in-memory `ExpenseStore` that records how often each
//! capability was invoked and can be told to fail.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::context::IngestContext;
use crate::error::{Error, Result};
use crate::models::{Category, Expense};
use crate::store::ExpenseStore;

#[derive(Default)]
pub struct MemoryStore {
    expenses: RefCell<HashMap<String, Expense>>,
    categories: RefCell<Vec<Category>>,
    next_id: Cell<i64>,
    pub lookups: Cell<usize>,
    pub category_lookups: Cell<usize>,
    pub batches: Cell<usize>,
    /// Title whose lookup fails with a database error
    pub fail_lookup_on: RefCell<Option<String>>,
    /// Make the next batch fail with a conflict
    pub fail_batch: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            ..Default::default()
        }
    }

    /// Store seeded with an active fallback category
    pub fn with_category(name: &str) -> Self {
        let store = Self::new();
        store.add_category(name);
        store
    }

    pub fn add_category(&self, name: &str) -> Category {
        let category = Category {
            id: self.bump(),
            name: name.to_string(),
            active: true,
        };
        self.categories.borrow_mut().push(category.clone());
        category
    }

    pub fn add_expense(&self, title: &str, category: Option<&Category>, active: bool) -> Expense {
        let expense = Expense {
            id: self.bump(),
            title: title.to_string(),
            category: category.map(|c| c.name.clone()),
            category_id: category.map(|c| c.id),
            value: Decimal::ZERO,
            active,
        };
        self.expenses
            .borrow_mut()
            .insert(title.to_string(), expense.clone());
        expense
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.borrow().len()
    }

    pub fn get(&self, title: &str) -> Option<Expense> {
        self.expenses.borrow().get(title).cloned()
    }

    fn bump(&self) -> i64 {
        let id = self.next_id.get().max(1);
        self.next_id.set(id + 1);
        id
    }
}

impl ExpenseStore for MemoryStore {
    fn find_expense_by_title(&self, title: &str, ctx: &IngestContext) -> Result<Option<Expense>> {
        ctx.checkpoint("expense lookup")?;
        self.lookups.set(self.lookups.get() + 1);
        if self.fail_lookup_on.borrow().as_deref() == Some(title) {
            return Err(Error::Database(rusqlite::Error::InvalidQuery));
        }
        Ok(self.get(title))
    }

    fn find_category_by_name(
        &self,
        name: &str,
        ctx: &IngestContext,
    ) -> Result<Option<Category>> {
        ctx.checkpoint("category lookup")?;
        self.category_lookups.set(self.category_lookups.get() + 1);
        Ok(self
            .categories
            .borrow()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn insert_expenses_batch(
        &self,
        titles: &[&str],
        category_id: i64,
        ctx: &IngestContext,
    ) -> Result<Vec<i64>> {
        ctx.checkpoint("batch insert")?;
        self.batches.set(self.batches.get() + 1);

        if self.fail_batch.get() {
            return Err(Error::Conflict(titles.first().unwrap_or(&"").to_string()));
        }
        let category = self
            .categories
            .borrow()
            .iter()
            .find(|c| c.id == category_id)
            .cloned();

        // Validate the whole batch before writing anything
        {
            let existing = self.expenses.borrow();
            if let Some(dup) = titles.iter().find(|t| existing.contains_key(**t)) {
                return Err(Error::Conflict(dup.to_string()));
            }
        }

        let ids: Vec<i64> = titles
            .iter()
            .map(|title| self.add_expense(title, category.as_ref(), true).id)
            .collect();
        Ok(ids)
    }
}
