//! Domain models for Tally

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An expense in the catalogue, or an aggregated line from a statement
///
/// `id == 0` marks an expense that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    /// Canonical title (deduplication key)
    pub title: String,
    /// Category name, resolved on reconciliation or insert
    pub category: Option<String>,
    pub category_id: Option<i64>,
    /// Sum of all statement amounts mapped to this title in one run
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub active: bool,
}

impl Expense {
    /// A transient expense freshly seen on a statement
    pub fn transient(title: impl Into<String>, value: Decimal) -> Self {
        Self {
            id: 0,
            title: title.into(),
            category: None,
            category_id: None,
            value,
            active: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// An expense category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

/// Aggregated expenses keyed by canonical title
pub type ExpenseMap = BTreeMap<String, Expense>;
