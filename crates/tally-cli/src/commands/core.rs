//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `default_category` / `store_timeout` - Settings read from the environment
//! - `cmd_init` - Initialize the database

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tally_core::{db::Database, DEFAULT_CATEGORY};
use tracing::warn;

/// Environment variable overriding the fallback category name
pub const DEFAULT_CATEGORY_ENV: &str = "TALLY_DEFAULT_CATEGORY";

/// Environment variable overriding the store deadline, in milliseconds
pub const STORE_TIMEOUT_ENV: &str = "TALLY_STORE_TIMEOUT_MS";

const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

pub fn open_db(db_path: &Path) -> Result<Database> {
    Database::new(&db_path.to_string_lossy())
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}

/// Category that first-seen expenses are filed under
pub fn default_category() -> String {
    std::env::var(DEFAULT_CATEGORY_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Store deadline: explicit flag, then environment, then the built-in default
pub fn store_timeout(flag: Option<u64>) -> Duration {
    let from_env = || {
        let raw = std::env::var(STORE_TIMEOUT_ENV).ok()?;
        match raw.trim().parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                warn!("Ignoring invalid {}={:?}", STORE_TIMEOUT_ENV, raw);
                None
            }
        }
    };
    Duration::from_millis(flag.or_else(from_env).unwrap_or(DEFAULT_STORE_TIMEOUT_MS))
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    let category = db
        .seed_default_category(&default_category())
        .context("Failed to seed default category")?;
    println!("   Default category: {} (id {})", category.name, category.id);

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Reconcile a statement: tally import --file statement.csv");
    println!("  2. Start web server: tally serve");

    Ok(())
}
