//! Repository layer for RBAC persistence.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for policies,
//!   permissions and team-policy links.
//! - Keep SQL details and session scoping inside the persistence boundary.
//!
//! # Invariants
//! - Every write runs inside one transactional session; reads use plain
//!   sessions.
//! - Repository APIs return semantic errors (`PolicyNotFound`,
//!   `TeamPolicyAlreadyExists`, ...) in addition to storage errors.

use crate::db::schema::{schema_version, SCHEMA_VERSION};
use rusqlite::Connection;

pub mod error;
pub mod existence;
pub mod policy_repo;
pub mod team_policy_repo;

use self::error::{RbacError, RbacResult};

/// Verifies that `conn` is bootstrapped and carries `tables`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RbacResult<()> {
    let expected_version = SCHEMA_VERSION;
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RbacError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in tables {
        if !table_exists(conn, table)? {
            return Err(RbacError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RbacResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
