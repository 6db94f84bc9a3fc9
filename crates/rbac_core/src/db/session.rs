//! Scoped session helpers for repository operations.
//!
//! # Responsibility
//! - Run read paths on a plain (non-transactional) session.
//! - Run write paths inside one IMMEDIATE transaction.
//!
//! # Invariants
//! - A transactional block commits only when the closure returns `Ok`.
//! - Every other exit path (error return, `?`, panic) rolls back, because the
//!   uncommitted transaction guard rolls back on drop.
//! - Sessions do not nest; opening a transaction inside another one fails
//!   with a storage error.

use log::debug;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `f` against `conn` without opening a transaction.
///
/// Multiple reads issued by `f` are not snapshot-consistent with each other.
pub fn with_db_session<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
{
    f(conn)
}

/// Runs `f` inside one IMMEDIATE transaction on `conn`.
///
/// Commits when `f` returns `Ok`; any error from `f` (or from commit itself)
/// is returned unchanged after the transaction is rolled back.
pub fn with_transactional_db_session<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    E: From<rusqlite::Error>,
    F: FnOnce(&Connection) -> Result<T, E>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    debug!("event=tx_begin module=db status=ok");

    match f(&tx) {
        Ok(value) => {
            tx.commit()?;
            debug!("event=tx_commit module=db status=ok");
            Ok(value)
        }
        Err(err) => {
            drop(tx);
            debug!("event=tx_rollback module=db status=ok");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{with_db_session, with_transactional_db_session};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    fn team_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM team;", [], |row| row.get(0))
            .expect("count should succeed")
    }

    #[test]
    fn transactional_session_commits_on_ok() {
        let conn = open_db_in_memory().expect("db should open");

        let inserted: rusqlite::Result<usize> = with_transactional_db_session(&conn, |tx| {
            tx.execute("INSERT INTO team (org_id, name) VALUES (1, 'ops');", [])
        });

        assert_eq!(inserted.expect("insert should succeed"), 1);
        assert_eq!(team_count(&conn), 1);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn transactional_session_rolls_back_on_error() {
        let conn = open_db_in_memory().expect("db should open");

        let result: rusqlite::Result<()> = with_transactional_db_session(&conn, |tx| {
            tx.execute("INSERT INTO team (org_id, name) VALUES (1, 'ops');", [])?;
            tx.execute("INSERT INTO team (org_id, name) VALUES (1, 'ops');", [])?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(team_count(&conn), 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn nested_transaction_is_rejected() {
        let conn = open_db_in_memory().expect("db should open");

        let result: rusqlite::Result<()> = with_transactional_db_session(&conn, |tx| {
            with_transactional_db_session(tx, |_| Ok(()))
        });

        assert!(result.is_err());
        assert!(conn.is_autocommit());
    }

    #[test]
    fn plain_session_passes_connection_through() {
        let conn = open_db_in_memory().expect("db should open");

        let count: rusqlite::Result<i64> =
            with_db_session(&conn, |session| Ok(team_count(session)));

        assert_eq!(count.expect("read should succeed"), 0);
    }
}
