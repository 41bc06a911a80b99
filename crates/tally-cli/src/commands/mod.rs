//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, env settings)
//! - `import` - Statement reconciliation from a CSV file
//! - `serve` - Web server command
//! - `categories` - Category management commands
//! - `expenses` - Catalogue expense management commands

pub mod categories;
pub mod core;
pub mod expenses;
pub mod import;
pub mod serve;

// Re-export command functions for main.rs
pub use categories::*;
pub use core::*;
pub use expenses::*;
pub use import::*;
pub use serve::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
