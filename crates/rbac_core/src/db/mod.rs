//! SQLite storage bootstrap, session scoping and constraint classification.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the RBAC store.
//! - Create the RBAC schema on first writable open.
//! - Provide scoped plain/transactional sessions for repositories.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write policy data before bootstrap succeeds.
//! - The schema declares no foreign keys; relational integrity is enforced by
//!   repository write paths.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod constraint;
mod open;
pub mod schema;
pub mod session;

pub use open::{open_db, open_db_in_memory, open_db_read_only};
pub use session::{with_db_session, with_transactional_db_session};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or bootstrapping an RBAC store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected the open, a pragma, or the schema script.
    Sqlite(rusqlite::Error),
    /// The file carries a schema stamp other than the RBAC one.
    SchemaMismatch { found: u32, expected: u32 },
    /// Read-only open of a path with no database file.
    MissingDatabase(PathBuf),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaMismatch { found: 0, .. } => {
                write!(f, "database has no RBAC schema")
            }
            Self::SchemaMismatch { found, expected } => write!(
                f,
                "database schema version {found} is not the RBAC schema version {expected}"
            ),
            Self::MissingDatabase(path) => {
                write!(f, "database file `{}` does not exist", path.display())
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
