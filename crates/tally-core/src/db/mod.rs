//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `categories` - Category CRUD
//! - `expenses` - Expense catalogue CRUD
//! - `catalogue` - `ExpenseStore` implementation used by statement ingestion

use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{ffi, ErrorCode};
use tracing::info;

use crate::context::IngestContext;
use crate::error::{Error, Result};
use crate::models::Category;

mod catalogue;
mod categories;
mod expenses;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Maximum pooled connections
pub const POOL_SIZE: u32 = 10;

/// Lock wait for connections not bound to an ingestion deadline
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let pool = Pool::builder().max_size(POOL_SIZE).build(manager)?;

        let db = Self { pool };
        db.run_migrations()?;

        Ok(db)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled
    /// connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        let conn = self.pool.get()?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Get a connection whose pool wait and lock waits end at the context deadline
    pub(crate) fn bounded_conn(&self, ctx: &IngestContext) -> Result<DbConn> {
        ctx.checkpoint("acquiring connection")?;
        let conn = match ctx.remaining() {
            Some(remaining) => self.pool.get_timeout(remaining).map_err(|e| {
                // A wait cut short by the deadline is a timeout, not a pool fault
                ctx.checkpoint("acquiring connection").err().unwrap_or(Error::Pool(e))
            })?,
            None => self.pool.get()?,
        };
        conn.busy_timeout(ctx.remaining().unwrap_or(DEFAULT_BUSY_TIMEOUT))?;
        Ok(conn)
    }

    /// Make sure the fallback category exists, returning it
    pub fn seed_default_category(&self, name: &str) -> Result<Category> {
        let conn = self.conn()?;
        let created = conn.execute(
            "INSERT INTO categories (name) VALUES (?) ON CONFLICT(name) DO NOTHING",
            [name],
        )?;
        if created > 0 {
            info!("Seeded default category '{}'", name);
        }
        drop(conn);

        self.get_category_by_name(name)?
            .ok_or_else(|| Error::NotFound(format!("category '{}'", name)))
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the single writer
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Categories (names unique regardless of case)
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Expense catalogue keyed by canonical title
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL UNIQUE,
                category_id INTEGER REFERENCES categories(id),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id);
            CREATE INDEX IF NOT EXISTS idx_expenses_active ON expenses(is_active);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

/// Translate SQLite failures into domain errors
///
/// `subject` names the record involved (a title or category name).
pub(crate) fn classify(err: rusqlite::Error, subject: &str) -> Error {
    if let rusqlite::Error::SqliteFailure(ref e, _) = err {
        match e.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                return Error::Timeout(format!("database busy on '{}'", subject));
            }
            ErrorCode::ConstraintViolation => match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Error::Conflict(format!("'{}' already exists", subject));
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Error::InvalidData(format!("unknown category for '{}'", subject));
                }
                _ => {}
            },
            _ => {}
        }
    }
    Error::Database(err)
}
