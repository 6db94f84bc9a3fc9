//! Policy/permission repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `policy` and its owned `permission` rows.
//! - Map storage uniqueness violations to `DuplicatePolicyName`.
//!
//! # Invariants
//! - Policy lookups are always filtered by `org_id`.
//! - Deleting a policy deletes its permissions and team links in the same
//!   transaction; deleting a missing policy or permission is a no-op.
//! - Permissions can only be created under a policy of the same org.

use crate::clock::{Clock, SystemClock};
use crate::db::constraint::unique_violation_on;
use crate::db::{with_db_session, with_transactional_db_session};
use crate::model::policy::{OrgId, Permission, PermissionId, Policy, PolicyDetail, PolicyId};
use crate::repo::ensure_connection_ready;
use crate::repo::error::{RbacError, RbacResult};
use crate::repo::existence::ensure_policy_exists;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const POLICY_SELECT_SQL: &str = "SELECT
    id,
    uid,
    org_id,
    name,
    description,
    created,
    updated
FROM policy";

const PERMISSION_SELECT_SQL: &str = "SELECT
    id,
    policy_id,
    org_id,
    resource,
    resource_type,
    action,
    created,
    updated
FROM permission";

/// Repository interface for policy and permission operations.
pub trait PolicyRepository {
    /// Lists all policies of one org.
    fn list_policies(&self, org_id: OrgId) -> RbacResult<Vec<Policy>>;
    /// Loads one policy with its permissions.
    fn get_policy(&self, policy_id: PolicyId, org_id: OrgId) -> RbacResult<PolicyDetail>;
    /// Creates one policy.
    fn create_policy(&self, org_id: OrgId, name: &str, description: &str) -> RbacResult<Policy>;
    /// Deletes one policy and everything it owns.
    fn delete_policy(&self, policy_id: PolicyId, org_id: OrgId) -> RbacResult<()>;
    /// Lists permissions of one policy, regardless of org.
    fn get_policy_permissions(&self, policy_id: PolicyId) -> RbacResult<Vec<Permission>>;
    /// Creates one permission under an existing policy.
    fn create_permission(
        &self,
        org_id: OrgId,
        policy_id: PolicyId,
        resource: &str,
        resource_type: &str,
        action: &str,
    ) -> RbacResult<Permission>;
    /// Deletes one permission.
    fn delete_permission(&self, id: PermissionId, org_id: OrgId) -> RbacResult<()>;
}

/// SQLite-backed policy repository.
pub struct SqlitePolicyRepository<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqlitePolicyRepository<'conn, SystemClock> {
    /// Creates repository from a bootstrapped connection using wall-clock time.
    pub fn try_new(conn: &'conn Connection) -> RbacResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqlitePolicyRepository<'conn, C> {
    /// Creates repository from a bootstrapped connection and time source.
    pub fn with_clock(conn: &'conn Connection, clock: C) -> RbacResult<Self> {
        ensure_connection_ready(conn, &["policy", "permission", "team_policy"])?;
        Ok(Self { conn, clock })
    }
}

impl<C: Clock> PolicyRepository for SqlitePolicyRepository<'_, C> {
    fn list_policies(&self, org_id: OrgId) -> RbacResult<Vec<Policy>> {
        with_db_session(self.conn, |session| -> RbacResult<Vec<Policy>> {
            let mut stmt = session.prepare(&format!(
                "{POLICY_SELECT_SQL}
                 WHERE org_id = ?1
                 ORDER BY id ASC;"
            ))?;
            let mut rows = stmt.query([org_id])?;
            let mut policies = Vec::new();
            while let Some(row) = rows.next()? {
                policies.push(parse_policy_row(row)?);
            }
            Ok(policies)
        })
        .map_err(|err| err.with_context(|| format!("list policies in org {org_id}")))
    }

    fn get_policy(&self, policy_id: PolicyId, org_id: OrgId) -> RbacResult<PolicyDetail> {
        with_db_session(self.conn, |session| -> RbacResult<PolicyDetail> {
            let policy = load_policy(session, policy_id, org_id)?
                .ok_or(RbacError::PolicyNotFound { org_id, policy_id })?;
            let permissions = load_policy_permissions(session, policy_id)?;
            Ok(PolicyDetail::with_permissions(policy, permissions))
        })
        .map_err(|err| err.with_context(|| format!("get policy {policy_id} in org {org_id}")))
    }

    fn create_policy(&self, org_id: OrgId, name: &str, description: &str) -> RbacResult<Policy> {
        with_transactional_db_session(self.conn, |tx| -> RbacResult<Policy> {
            let now = self.clock.now_epoch_ms();
            let uid = Uuid::new_v4();
            let inserted = tx.execute(
                "INSERT INTO policy (
                    uid,
                    org_id,
                    name,
                    description,
                    created,
                    updated
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![uid.to_string(), org_id, name, description, now, now],
            );

            if let Err(err) = inserted {
                if unique_violation_on(&err, "name") {
                    return Err(RbacError::DuplicatePolicyName {
                        org_id,
                        name: name.to_string(),
                        source: err,
                    });
                }
                return Err(err.into());
            }

            Ok(Policy {
                id: tx.last_insert_rowid(),
                uid,
                org_id,
                name: name.to_string(),
                description: description.to_string(),
                created: now,
                updated: now,
            })
        })
        .map_err(|err| err.with_context(|| format!("create policy `{name}` in org {org_id}")))
    }

    fn delete_policy(&self, policy_id: PolicyId, org_id: OrgId) -> RbacResult<()> {
        with_transactional_db_session(self.conn, |tx| -> RbacResult<()> {
            // Children go first so the ownership guard still sees the policy row.
            tx.execute(
                "DELETE FROM permission
                 WHERE policy_id = ?1
                   AND EXISTS (SELECT 1 FROM policy WHERE id = ?1 AND org_id = ?2);",
                params![policy_id, org_id],
            )?;
            tx.execute(
                "DELETE FROM team_policy
                 WHERE policy_id = ?1
                   AND EXISTS (SELECT 1 FROM policy WHERE id = ?1 AND org_id = ?2);",
                params![policy_id, org_id],
            )?;
            tx.execute(
                "DELETE FROM policy WHERE id = ?1 AND org_id = ?2;",
                params![policy_id, org_id],
            )?;
            Ok(())
        })
        .map_err(|err| err.with_context(|| format!("delete policy {policy_id} in org {org_id}")))
    }

    fn get_policy_permissions(&self, policy_id: PolicyId) -> RbacResult<Vec<Permission>> {
        with_db_session(self.conn, |session| load_policy_permissions(session, policy_id))
            .map_err(|err| err.with_context(|| format!("list permissions of policy {policy_id}")))
    }

    fn create_permission(
        &self,
        org_id: OrgId,
        policy_id: PolicyId,
        resource: &str,
        resource_type: &str,
        action: &str,
    ) -> RbacResult<Permission> {
        with_transactional_db_session(self.conn, |tx| -> RbacResult<Permission> {
            ensure_policy_exists(tx, org_id, policy_id)?;

            let now = self.clock.now_epoch_ms();
            tx.execute(
                "INSERT INTO permission (
                    policy_id,
                    org_id,
                    resource,
                    resource_type,
                    action,
                    created,
                    updated
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![policy_id, org_id, resource, resource_type, action, now, now],
            )?;

            Ok(Permission {
                id: tx.last_insert_rowid(),
                policy_id,
                org_id,
                resource: resource.to_string(),
                resource_type: resource_type.to_string(),
                action: action.to_string(),
                created: now,
                updated: now,
            })
        })
        .map_err(|err| {
            err.with_context(|| {
                format!("create permission `{action}` on policy {policy_id} in org {org_id}")
            })
        })
    }

    fn delete_permission(&self, id: PermissionId, org_id: OrgId) -> RbacResult<()> {
        with_transactional_db_session(self.conn, |tx| -> RbacResult<()> {
            tx.execute(
                "DELETE FROM permission WHERE id = ?1 AND org_id = ?2;",
                params![id, org_id],
            )?;
            Ok(())
        })
        .map_err(|err| err.with_context(|| format!("delete permission {id} in org {org_id}")))
    }
}

fn load_policy(
    conn: &Connection,
    policy_id: PolicyId,
    org_id: OrgId,
) -> RbacResult<Option<Policy>> {
    let mut stmt = conn.prepare(&format!(
        "{POLICY_SELECT_SQL}
         WHERE id = ?1
           AND org_id = ?2;"
    ))?;
    let mut rows = stmt.query(params![policy_id, org_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_policy_row(row)?));
    }
    Ok(None)
}

fn load_policy_permissions(conn: &Connection, policy_id: PolicyId) -> RbacResult<Vec<Permission>> {
    let mut stmt = conn.prepare(&format!(
        "{PERMISSION_SELECT_SQL}
         WHERE policy_id = ?1
         ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([policy_id])?;
    let mut permissions = Vec::new();
    while let Some(row) = rows.next()? {
        permissions.push(parse_permission_row(row)?);
    }
    Ok(permissions)
}

/// Converts one `policy` row (selected with the standard column names).
pub(crate) fn parse_policy_row(row: &Row<'_>) -> RbacResult<Policy> {
    let uid_text: String = row.get("uid")?;
    let uid = Uuid::parse_str(&uid_text).map_err(|_| {
        RbacError::InvalidData(format!("invalid uuid value `{uid_text}` in policy.uid"))
    })?;

    Ok(Policy {
        id: row.get("id")?,
        uid,
        org_id: row.get("org_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created: row.get("created")?,
        updated: row.get("updated")?,
    })
}

fn parse_permission_row(row: &Row<'_>) -> RbacResult<Permission> {
    Ok(Permission {
        id: row.get("id")?,
        policy_id: row.get("policy_id")?,
        org_id: row.get("org_id")?,
        resource: row.get("resource")?,
        resource_type: row.get("resource_type")?,
        action: row.get("action")?,
        created: row.get("created")?,
        updated: row.get("updated")?,
    })
}
