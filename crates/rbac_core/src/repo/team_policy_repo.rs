//! Team-policy link repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Manage the `team_policy` association between teams and policies.
//! - Validate both ends of a link inside the mutating transaction.
//!
//! # Invariants
//! - At most one link per `(org_id, team_id, policy_id)`.
//! - Add checks run in a fixed order: duplicate, team, policy. The first
//!   failing check decides the returned error.
//! - Removing a link that does not exist fails with `TeamPolicyNotFound`.
//! - The duplicate pre-check is best-effort; the unique index is the
//!   backstop for concurrent adds and maps to the same error.

use crate::clock::{Clock, SystemClock};
use crate::db::constraint::is_unique_violation;
use crate::db::{with_db_session, with_transactional_db_session};
use crate::model::policy::{OrgId, PolicyDetail, PolicyId, TeamId, TeamPolicy};
use crate::repo::ensure_connection_ready;
use crate::repo::error::{RbacError, RbacResult};
use crate::repo::existence::{ensure_policy_exists, ensure_team_exists};
use crate::repo::policy_repo::parse_policy_row;
use rusqlite::{params, Connection};

/// Repository interface for team-policy link operations.
pub trait TeamPolicyRepository {
    /// Lists policy summaries linked to one team.
    fn list_team_policies(&self, team_id: TeamId, org_id: OrgId)
        -> RbacResult<Vec<PolicyDetail>>;
    /// Links one team to one policy.
    fn add_team_policy(
        &self,
        org_id: OrgId,
        team_id: TeamId,
        policy_id: PolicyId,
    ) -> RbacResult<TeamPolicy>;
    /// Removes one existing link.
    fn remove_team_policy(
        &self,
        org_id: OrgId,
        team_id: TeamId,
        policy_id: PolicyId,
    ) -> RbacResult<()>;
}

/// SQLite-backed team-policy repository.
pub struct SqliteTeamPolicyRepository<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqliteTeamPolicyRepository<'conn, SystemClock> {
    /// Creates repository from a bootstrapped connection using wall-clock time.
    pub fn try_new(conn: &'conn Connection) -> RbacResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqliteTeamPolicyRepository<'conn, C> {
    /// Creates repository from a bootstrapped connection and time source.
    pub fn with_clock(conn: &'conn Connection, clock: C) -> RbacResult<Self> {
        ensure_connection_ready(conn, &["team", "policy", "team_policy"])?;
        Ok(Self { conn, clock })
    }
}

impl<C: Clock> TeamPolicyRepository for SqliteTeamPolicyRepository<'_, C> {
    fn list_team_policies(
        &self,
        team_id: TeamId,
        org_id: OrgId,
    ) -> RbacResult<Vec<PolicyDetail>> {
        with_db_session(self.conn, |session| -> RbacResult<Vec<PolicyDetail>> {
            let mut stmt = session.prepare(
                "SELECT
                    p.id AS id,
                    p.uid AS uid,
                    p.org_id AS org_id,
                    p.name AS name,
                    p.description AS description,
                    p.created AS created,
                    p.updated AS updated
                 FROM policy p
                 INNER JOIN team_policy tp
                    ON tp.policy_id = p.id
                   AND tp.team_id = ?1
                   AND tp.org_id = ?2
                 WHERE p.org_id = ?2
                 ORDER BY p.id ASC;",
            )?;
            let mut rows = stmt.query(params![team_id, org_id])?;
            let mut policies = Vec::new();
            while let Some(row) = rows.next()? {
                policies.push(PolicyDetail::summary(parse_policy_row(row)?));
            }
            Ok(policies)
        })
        .map_err(|err| {
            err.with_context(|| format!("list policies of team {team_id} in org {org_id}"))
        })
    }

    fn add_team_policy(
        &self,
        org_id: OrgId,
        team_id: TeamId,
        policy_id: PolicyId,
    ) -> RbacResult<TeamPolicy> {
        let already_exists = || RbacError::TeamPolicyAlreadyExists {
            org_id,
            team_id,
            policy_id,
        };

        with_transactional_db_session(self.conn, |tx| -> RbacResult<TeamPolicy> {
            if link_exists(tx, org_id, team_id, policy_id)? {
                return Err(already_exists());
            }
            ensure_team_exists(tx, org_id, team_id)?;
            ensure_policy_exists(tx, org_id, policy_id)?;

            let now = self.clock.now_epoch_ms();
            let inserted = tx.execute(
                "INSERT INTO team_policy (
                    org_id,
                    team_id,
                    policy_id,
                    created,
                    updated
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![org_id, team_id, policy_id, now, now],
            );
            match inserted {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => return Err(already_exists()),
                Err(err) => return Err(err.into()),
            }

            Ok(TeamPolicy {
                id: tx.last_insert_rowid(),
                org_id,
                team_id,
                policy_id,
                created: now,
                updated: now,
            })
        })
        .map_err(|err| {
            err.with_context(|| {
                format!("add policy {policy_id} to team {team_id} in org {org_id}")
            })
        })
    }

    fn remove_team_policy(
        &self,
        org_id: OrgId,
        team_id: TeamId,
        policy_id: PolicyId,
    ) -> RbacResult<()> {
        with_transactional_db_session(self.conn, |tx| -> RbacResult<()> {
            ensure_team_exists(tx, org_id, team_id)?;
            ensure_policy_exists(tx, org_id, policy_id)?;

            let changed = tx.execute(
                "DELETE FROM team_policy
                 WHERE org_id = ?1
                   AND team_id = ?2
                   AND policy_id = ?3;",
                params![org_id, team_id, policy_id],
            )?;
            if changed == 0 {
                return Err(RbacError::TeamPolicyNotFound {
                    org_id,
                    team_id,
                    policy_id,
                });
            }
            Ok(())
        })
        .map_err(|err| {
            err.with_context(|| {
                format!("remove policy {policy_id} from team {team_id} in org {org_id}")
            })
        })
    }
}

fn link_exists(
    conn: &Connection,
    org_id: OrgId,
    team_id: TeamId,
    policy_id: PolicyId,
) -> RbacResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM team_policy
            WHERE org_id = ?1
              AND team_id = ?2
              AND policy_id = ?3
        );",
        params![org_id, team_id, policy_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{SqliteTeamPolicyRepository, TeamPolicyRepository};
    use crate::db::open_db_in_memory;
    use crate::repo::error::RbacError;
    use rusqlite::Connection;

    fn link_rows(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM team_policy;", [], |row| row.get(0))
            .expect("count should succeed")
    }

    #[test]
    fn unique_violation_on_insert_maps_to_already_exists() {
        let conn = open_db_in_memory().expect("db should open");
        conn.execute_batch(
            "INSERT INTO team (id, org_id, name) VALUES (10, 1, 'ops');
             INSERT INTO policy (id, uid, org_id, name, description, created, updated)
             VALUES (20, 'uid-20', 1, 'viewers', '', 0, 0);
             INSERT INTO team_policy (org_id, team_id, policy_id, created, updated)
             VALUES (2, 10, 20, 0, 0);
             CREATE UNIQUE INDEX idx_team_policy_team_id_policy_id
                ON team_policy (team_id, policy_id);",
        )
        .expect("setup should succeed");
        let repo = SqliteTeamPolicyRepository::try_new(&conn).expect("repo should build");

        // The org-scoped pre-check misses the org 2 row; only the insert collides.
        let err = repo
            .add_team_policy(1, 10, 20)
            .expect_err("insert collision must fail");

        assert!(matches!(
            err,
            RbacError::TeamPolicyAlreadyExists {
                org_id: 1,
                team_id: 10,
                policy_id: 20
            }
        ));
        assert_eq!(link_rows(&conn), 1);
    }
}
