//! Statement import command

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;
use tally_core::summary::{total, totals_by_category};
use tally_core::{ingest_statement, ExpenseMap, IngestContext, IngestOptions, IngestOutcome};

use super::{default_category, store_timeout, truncate};

/// Reconcile a statement file against the catalogue, returning the outcome
pub fn import_statement(db: &Database, file: &Path, timeout_ms: Option<u64>) -> Result<IngestOutcome> {
    let handle =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;

    let options = IngestOptions {
        default_category: default_category(),
        ..Default::default()
    };
    let ctx = IngestContext::with_timeout(store_timeout(timeout_ms));

    ingest_statement(BufReader::new(handle), db, &options, &ctx)
        .with_context(|| format!("Failed to import {}", file.display()))
}

pub fn cmd_import(db: &Database, file: &Path, timeout_ms: Option<u64>, json: bool) -> Result<()> {
    let outcome = import_statement(db, file, timeout_ms)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.expenses)?);
        return Ok(());
    }

    println!("📥 Reconciled {}", file.display());
    println!(
        "   {} expenses ({} known, {} new)",
        outcome.expenses.len(),
        outcome.matched,
        outcome.inserted
    );
    print_expenses(&outcome.expenses)
}

fn print_expenses(expenses: &ExpenseMap) -> Result<()> {
    if expenses.is_empty() {
        return Ok(());
    }
    let grand_total = total(expenses)?;
    let by_category = totals_by_category(expenses)?;

    println!();
    println!("   {:<40} {:<16} {:>12}", "Title", "Category", "Value");
    println!("   {}", "─".repeat(70));
    for expense in expenses.values() {
        println!(
            "   {:<40} {:<16} {:>12}",
            truncate(&expense.title, 40),
            truncate(expense.category.as_deref().unwrap_or("-"), 16),
            expense.value.to_string()
        );
    }
    println!("   {}", "─".repeat(70));
    println!("   {:<57} {:>12}", "Total", grand_total.to_string());

    println!();
    println!("   By category:");
    for (category, value) in by_category {
        println!("   • {:<40} {:>12}", category, value.to_string());
    }

    Ok(())
}
