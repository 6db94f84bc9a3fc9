//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure the busy timeout.
//! - Create the RBAC schema before returning a writable connection.
//!
//! # Invariants
//! - Writable connections carry `SCHEMA_VERSION`.
//! - Read-only opens never create files or tables.

use super::schema::{ensure_schema, verify_schema};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and applies the RBAC schema if missing.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with(
        "file",
        || Ok(Connection::open(path)?),
        ensure_schema,
    )
}

/// Opens an in-memory SQLite database with the RBAC schema applied.
///
/// Every call returns an independent, empty store.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(
        "memory",
        || Ok(Connection::open_in_memory()?),
        ensure_schema,
    )
}

/// Opens an existing RBAC database for inspection.
///
/// # Errors
/// - `MissingDatabase` when `path` is not an existing file.
/// - `SchemaMismatch` when the file was never bootstrapped as an RBAC store.
pub fn open_db_read_only(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with(
        "read_only",
        || {
            if !path.is_file() {
                return Err(DbError::MissingDatabase(path.to_path_buf()));
            }
            Ok(Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?)
        },
        |conn| verify_schema(conn),
    )
}

fn open_with<F, B>(mode: &'static str, open: F, bootstrap: B) -> DbResult<Connection>
where
    F: FnOnce() -> DbResult<Connection>,
    B: FnOnce(&mut Connection) -> DbResult<()>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }
    };

    if let Err(err) = bootstrap_connection(&mut conn, bootstrap) {
        error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={} duration_ms={}",
        mode,
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection<B>(conn: &mut Connection, bootstrap: B) -> DbResult<()>
where
    B: FnOnce(&mut Connection) -> DbResult<()>,
{
    conn.busy_timeout(BUSY_TIMEOUT)?;
    bootstrap(conn)
}
