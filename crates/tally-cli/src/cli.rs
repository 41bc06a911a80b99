//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Reconcile bank statements against your expense catalogue
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Statement-to-expense reconciliation service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the default category
    Init,

    /// Reconcile a statement CSV against the catalogue
    Import {
        /// CSV file to import (date,description,amount)
        #[arg(short, long)]
        file: PathBuf,

        /// Deadline for reconciliation and insert, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print the reconciled expenses as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Deadline for each upload, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Manage categories (list, add, rename, disable)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage catalogue expenses (list, add, disable)
    Expenses {
        #[command(subcommand)]
        action: Option<ExpensesAction>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List {
        /// Show disabled categories instead
        #[arg(long)]
        inactive: bool,
    },

    /// Add a new category
    Add {
        /// Category name
        name: String,
    },

    /// Rename a category
    Rename {
        /// Category ID
        id: i64,
        /// New name
        name: String,
    },

    /// Disable a category
    Disable {
        /// Category ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ExpensesAction {
    /// List catalogue expenses
    List {
        /// Show disabled expenses instead
        #[arg(long)]
        inactive: bool,
    },

    /// Add an expense to the catalogue
    Add {
        /// Canonical title (as it appears after normalization)
        title: String,
        /// Category name
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Disable an expense
    Disable {
        /// Expense ID
        id: i64,
    },
}
