//! Database layer for the clinic store.

mod schema;
mod users;
mod patients;
mod remedies;
mod visits;
mod visit_medicines;
mod payments;
mod views;

pub use schema::*;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use rusqlite::{ffi, Connection, ErrorCode};
use thiserror::Error;

use crate::config::StoreConfig;

/// Kind of integrity rule a rejected write broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// A required field was omitted
    NullViolation,
    /// Duplicate username, national identifier or per-visit payment
    UniqueViolation,
    /// Value outside an enumerated domain or failing a validation rule
    CheckViolation,
    /// Reference to a missing parent row, or delete of a referenced row
    ForeignKeyViolation,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::NullViolation => "NullViolation",
            ConstraintKind::UniqueViolation => "UniqueViolation",
            ConstraintKind::CheckViolation => "CheckViolation",
            ConstraintKind::ForeignKeyViolation => "ForeignKeyViolation",
        };
        f.write_str(name)
    }
}

/// A write rejected by the schema or by write-boundary validation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    pub message: String,
}

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(ConstraintViolation),
}

impl DbError {
    /// Build a check violation raised by validation outside SQLite.
    pub fn check(message: impl Into<String>) -> Self {
        DbError::Constraint(ConstraintViolation {
            kind: ConstraintKind::CheckViolation,
            message: message.into(),
        })
    }

    /// The violated constraint kind, if this is a constraint error.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            DbError::Constraint(v) => Some(v.kind),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        let kind = match &e {
            rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                Some(classify_constraint(err.extended_code))
            }
            _ => None,
        };

        match kind {
            Some(kind) => {
                warn!("write rejected ({}): {}", kind, e);
                DbError::Constraint(ConstraintViolation {
                    kind,
                    message: e.to_string(),
                })
            }
            None => DbError::Sqlite(e),
        }
    }
}

/// Map an SQLite extended result code onto the constraint taxonomy.
fn classify_constraint(extended_code: i32) -> ConstraintKind {
    match extended_code {
        ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NullViolation,
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            ConstraintKind::UniqueViolation
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKeyViolation,
        // CHECK clauses and trigger RAISE(ABORT) guards
        _ => ConstraintKind::CheckViolation,
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        let db = Self { conn };
        db.initialize()?;
        info!("opened clinic database at {}", path.as_ref().display());
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Open the database described by a store configuration and seed its accounts.
    pub fn open_with_config(config: &StoreConfig) -> DbResult<Self> {
        let db = Self::open(&config.database_path)?;
        db.conn
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        db.seed_users(&config.seed_users)?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction through a shared reference.
    ///
    /// The other `Database` methods run inside it until it is committed;
    /// dropping it uncommitted rolls everything back.
    pub fn begin_write(&self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }
}
