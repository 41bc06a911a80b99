//! Category command implementations

use anyhow::Result;
use tally_core::db::Database;

pub fn cmd_categories_list(db: &Database, active: bool) -> Result<()> {
    let categories = db.list_categories(active)?;

    if categories.is_empty() {
        if active {
            println!("No categories found. Run 'tally init' to seed the default category.");
        } else {
            println!("No disabled categories.");
        }
        return Ok(());
    }

    println!();
    println!("🗂️  Categories{}", if active { "" } else { " (disabled)" });
    println!("   ─────────────────────────────────────");
    for category in &categories {
        println!("   {:>5}  {}", category.id, category.name);
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, name: &str) -> Result<()> {
    let category = db.create_category(name)?;
    println!("✅ Created category '{}' (id {})", category.name, category.id);
    Ok(())
}

pub fn cmd_categories_rename(db: &Database, id: i64, name: &str) -> Result<()> {
    let current = db
        .get_category(id)?
        .ok_or_else(|| anyhow::anyhow!("Category {} not found", id))?;
    let updated = db.update_category(id, name, current.active)?;
    println!("✅ Renamed '{}' to '{}'", current.name, updated.name);
    Ok(())
}

pub fn cmd_categories_disable(db: &Database, id: i64) -> Result<()> {
    db.disable_category(id)?;
    println!("✅ Disabled category {}", id);
    Ok(())
}
