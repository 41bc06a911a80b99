//! Tally CLI - Statement-to-expense reconciliation
//!
//! Usage:
//!   tally init                 Initialize database
//!   tally import --file CSV    Reconcile a statement
//!   tally serve --port 3000    Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Import {
            file,
            timeout_ms,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_import(&db, &file, timeout_ms, json)
        }
        Commands::Serve {
            port,
            host,
            timeout_ms,
        } => {
            // Only the server runs on tokio; every other command is plain blocking SQLite
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(commands::cmd_serve(&cli.db, &host, port, timeout_ms))
        }
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(CategoriesAction::List { inactive: false }) => {
                    commands::cmd_categories_list(&db, true)
                }
                Some(CategoriesAction::List { inactive: true }) => {
                    commands::cmd_categories_list(&db, false)
                }
                Some(CategoriesAction::Add { name }) => commands::cmd_categories_add(&db, &name),
                Some(CategoriesAction::Rename { id, name }) => {
                    commands::cmd_categories_rename(&db, id, &name)
                }
                Some(CategoriesAction::Disable { id }) => commands::cmd_categories_disable(&db, id),
            }
        }
        Commands::Expenses { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_expenses_list(&db, true),
                Some(ExpensesAction::List { inactive }) => {
                    commands::cmd_expenses_list(&db, !inactive)
                }
                Some(ExpensesAction::Add { title, category }) => {
                    commands::cmd_expenses_add(&db, &title, category.as_deref())
                }
                Some(ExpensesAction::Disable { id }) => commands::cmd_expenses_disable(&db, id),
            }
        }
    }
}
