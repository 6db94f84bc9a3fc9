//! Existence probes for referenced teams and policies.
//!
//! Probes run on the caller's session so that, on write paths, the check and
//! the following mutation share one transaction.
//!
//! # Invariants
//! - Exactly one matching row means "exists". Zero rows and more than one row
//!   both surface as the not-found error; duplicates are an integrity
//!   violation and are not distinguished from absence.

use crate::model::policy::{OrgId, PolicyId, TeamId};
use crate::repo::error::{RbacError, RbacResult};
use rusqlite::{params, Connection};

/// Succeeds when exactly one team `team_id` exists in `org_id`.
pub fn ensure_team_exists(conn: &Connection, org_id: OrgId, team_id: TeamId) -> RbacResult<()> {
    let matches = count_probe_rows(
        conn,
        "SELECT 1 FROM team WHERE org_id = ?1 AND id = ?2;",
        org_id,
        team_id,
    )?;
    if matches != 1 {
        return Err(RbacError::TeamNotFound { org_id, team_id });
    }
    Ok(())
}

/// Succeeds when exactly one policy `policy_id` exists in `org_id`.
pub fn ensure_policy_exists(
    conn: &Connection,
    org_id: OrgId,
    policy_id: PolicyId,
) -> RbacResult<()> {
    let matches = count_probe_rows(
        conn,
        "SELECT 1 FROM policy WHERE org_id = ?1 AND id = ?2;",
        org_id,
        policy_id,
    )?;
    if matches != 1 {
        return Err(RbacError::PolicyNotFound { org_id, policy_id });
    }
    Ok(())
}

fn count_probe_rows(conn: &Connection, sql: &str, org_id: OrgId, id: i64) -> RbacResult<usize> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![org_id, id])?;
    let mut count = 0;
    while rows.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::{ensure_policy_exists, ensure_team_exists};
    use crate::db::open_db_in_memory;
    use crate::repo::error::RbacError;

    #[test]
    fn team_probe_is_org_scoped() {
        let conn = open_db_in_memory().expect("db should open");
        conn.execute(
            "INSERT INTO team (id, org_id, name) VALUES (10, 1, 'ops');",
            [],
        )
        .expect("team insert should succeed");

        ensure_team_exists(&conn, 1, 10).expect("team should exist in org 1");
        let err = ensure_team_exists(&conn, 2, 10).expect_err("team is not in org 2");
        assert!(matches!(
            err,
            RbacError::TeamNotFound {
                org_id: 2,
                team_id: 10
            }
        ));
    }

    #[test]
    fn duplicate_rows_are_reported_as_not_found() {
        let conn = open_db_in_memory().expect("db should open");
        conn.execute(
            "INSERT INTO policy (id, uid, org_id, name, description, created, updated)
             VALUES (20, 'a', 1, 'one', '', 0, 0);",
            [],
        )
        .expect("policy insert should succeed");
        ensure_policy_exists(&conn, 1, 20).expect("single row should exist");

        // `id` is the rowid, so duplicates are emulated with a view.
        conn.execute_batch(
            "ALTER TABLE team RENAME TO team_rows;
             CREATE TABLE team_extra (id INTEGER, org_id INTEGER);
             INSERT INTO team_extra (id, org_id) VALUES (10, 1), (10, 1);
             CREATE VIEW team AS SELECT id, org_id FROM team_extra;",
        )
        .expect("duplicate team view should be created");

        let err = ensure_team_exists(&conn, 1, 10).expect_err("duplicates are an error");
        assert!(matches!(err, RbacError::TeamNotFound { .. }));
    }
}
