//! Catalogue expense command implementations

use anyhow::Result;
use tally_core::db::Database;

use super::truncate;

pub fn cmd_expenses_list(db: &Database, active: bool) -> Result<()> {
    let expenses = db.list_expenses(active)?;

    if expenses.is_empty() {
        println!("No {}expenses in the catalogue.", if active { "" } else { "disabled " });
        return Ok(());
    }

    println!();
    println!("🧾 Expenses{}", if active { "" } else { " (disabled)" });
    println!("   {:>5}  {:<40} {}", "ID", "Title", "Category");
    println!("   {}", "─".repeat(64));
    for expense in &expenses {
        println!(
            "   {:>5}  {:<40} {}",
            expense.id,
            truncate(&expense.title, 40),
            expense.category.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub fn cmd_expenses_add(db: &Database, title: &str, category: Option<&str>) -> Result<()> {
    let category_id = match category {
        Some(name) => Some(
            db.get_category_by_name(name)?
                .ok_or_else(|| anyhow::anyhow!("Category '{}' not found", name))?
                .id,
        ),
        None => None,
    };

    let expense = db.create_expense(title, category_id)?;
    println!(
        "✅ Added '{}' (id {}) under {}",
        expense.title,
        expense.id,
        expense.category.as_deref().unwrap_or("no category")
    );
    Ok(())
}

pub fn cmd_expenses_disable(db: &Database, id: i64) -> Result<()> {
    db.disable_expense(id)?;
    println!("✅ Disabled expense {}", id);
    Ok(())
}
