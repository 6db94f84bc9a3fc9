//! RBAC schema bootstrap.
//!
//! The store has a single schema revision, stamped into
//! `PRAGMA user_version`. An unstamped database receives the tables on first
//! writable open; any stamp other than [`SCHEMA_VERSION`] is rejected and
//! left untouched.

use crate::db::{DbError, DbResult};
use rusqlite::{Connection, TransactionBehavior};

/// Schema revision written and accepted by this crate.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the RBAC tables on an unstamped database, or verifies the stamp.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    match schema_version(conn)? {
        0 => create_schema(conn),
        found => check_version(found),
    }
}

/// Verifies the stamp without writing anything.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    check_version(schema_version(conn)?)
}

/// Reads the schema stamp; `0` means the database was never bootstrapped.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn create_schema(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Another opener may have stamped the file before the write lock.
    match schema_version(&tx)? {
        0 => {}
        found => return check_version(found),
    }
    tx.execute_batch(SCHEMA_SQL)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

fn check_version(found: u32) -> DbResult<()> {
    if found == SCHEMA_VERSION {
        Ok(())
    } else {
        Err(DbError::SchemaMismatch {
            found,
            expected: SCHEMA_VERSION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_schema, schema_version, verify_schema, SCHEMA_VERSION};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn ensure_schema_stamps_fresh_database_once() {
        let mut conn = Connection::open_in_memory().expect("db should open");

        ensure_schema(&mut conn).expect("fresh db should bootstrap");
        ensure_schema(&mut conn).expect("stamped db should be accepted");

        assert_eq!(
            schema_version(&conn).expect("version should read"),
            SCHEMA_VERSION
        );
    }

    #[test]
    fn verify_schema_rejects_unstamped_database_without_writing() {
        let conn = Connection::open_in_memory().expect("db should open");

        let err = verify_schema(&conn).expect_err("unstamped db must be rejected");
        assert!(matches!(
            err,
            DbError::SchemaMismatch {
                found: 0,
                expected: SCHEMA_VERSION
            }
        ));
        let tables: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master;", [], |row| row.get(0))
            .expect("count should succeed");
        assert_eq!(tables, 0);
    }

    #[test]
    fn ensure_schema_leaves_foreign_stamp_untouched() {
        let mut conn = Connection::open_in_memory().expect("db should open");
        conn.pragma_update(None, "user_version", 7_u32)
            .expect("stamp should be written");

        let err = ensure_schema(&mut conn).expect_err("foreign stamp must be rejected");
        assert!(matches!(err, DbError::SchemaMismatch { found: 7, .. }));
        assert_eq!(schema_version(&conn).expect("version should read"), 7);
    }
}
