//! Totals over an ingested expense map

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::ExpenseMap;

/// Label used for expenses with no category
pub const UNCATEGORIZED: &str = "(uncategorized)";

/// Sum of every expense value
pub fn total(expenses: &ExpenseMap) -> Result<Decimal> {
    expenses
        .values()
        .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.value))
        .ok_or_else(|| Error::InvalidData("statement total overflows".to_string()))
}

/// Sum of expense values grouped by category name
pub fn totals_by_category(expenses: &ExpenseMap) -> Result<BTreeMap<String, Decimal>> {
    let mut groups: BTreeMap<String, Decimal> = BTreeMap::new();
    for expense in expenses.values() {
        let key = expense
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let sum = groups.entry(key.clone()).or_default();
        *sum = sum
            .checked_add(expense.value)
            .ok_or_else(|| Error::InvalidData(format!("total for '{}' overflows", key)))?;
    }
    Ok(groups)
}
