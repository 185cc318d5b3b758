//! # folio-db
//!
//! SQLite access layer for the Folio catalog.
//!
//! ## Schema
//!
//! - WAL mode, foreign keys enforced
//! - All timestamps are Unix epoch seconds (u64)
//! - Schema version stored in `PRAGMA user_version`
//!
//! Query functions take a borrowed [`Connection`] and return typed rows;
//! the catalog core never builds SQL text itself. [`Db`] is the shared,
//! cloneable handle components receive in their constructors.

pub mod migrations;
pub mod queries;
pub mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, ErrorCode};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database unavailable: {0}")]
    Unavailable(String),
}

impl DbError {
    /// True for UNIQUE / PRIMARY KEY violations.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Sqlite(e) => is_unique_violation(e),
            DbError::Constraint(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the Folio database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;",
    )?;
    Ok(())
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

/// `?1, ?2, ... ?n` for an `IN (...)` list.
pub(crate) fn placeholders(n: usize) -> String {
    placeholders_from(1, n)
}

/// `n` numbered placeholders starting at `?start`.
pub(crate) fn placeholders_from(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shared connection handle.
///
/// Every unit of work runs with exclusive access to the connection, so a
/// transaction opened inside [`Db::with_conn`] is never interleaved with
/// another caller's statements.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Open a file-backed database.
    pub fn open(path: &Path) -> Result<Self> {
        open(path).map(Self::new)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        open_memory().map(Self::new)
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// The lock is not re-entrant: `f` must not call back into another
    /// component holding the same handle.
    pub fn with_conn<T, E>(
        &self,
        f: impl FnOnce(&mut Connection) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<DbError>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| DbError::Unavailable("connection lock poisoned".to_string()))?;
        f(&mut *guard)
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").finish_non_exhaustive()
    }
}
