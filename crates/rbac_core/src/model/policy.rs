//! Policy, permission and team-policy records.
//!
//! # Invariants
//! - Policy `name` is unique within one `org_id`.
//! - Policy `uid` is unique store-wide and never reused.
//! - `created` and `updated` hold Unix epoch milliseconds and are equal on
//!   creation; no update path revises them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant isolation boundary.
pub type OrgId = i64;
/// Team identifier owned by the team subsystem.
pub type TeamId = i64;
/// Store-generated policy identifier.
pub type PolicyId = i64;
/// Store-generated permission identifier.
pub type PermissionId = i64;

/// Named, org-scoped bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    /// Stable external identifier, generated at creation.
    pub uid: Uuid,
    pub org_id: OrgId,
    pub name: String,
    pub description: String,
    pub created: i64,
    pub updated: i64,
}

/// Policy read model, optionally carrying its permission list.
///
/// `permissions` is `Some` for full detail reads and `None` for summaries
/// (for example policies listed through a team link).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDetail {
    pub id: PolicyId,
    pub uid: Uuid,
    pub org_id: OrgId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    pub created: i64,
    pub updated: i64,
}

impl PolicyDetail {
    /// Builds a summary (no permissions attached) from a policy record.
    pub fn summary(policy: Policy) -> Self {
        Self {
            id: policy.id,
            uid: policy.uid,
            org_id: policy.org_id,
            name: policy.name,
            description: policy.description,
            permissions: None,
            created: policy.created,
            updated: policy.updated,
        }
    }

    /// Builds a full detail view from a policy and its permissions.
    pub fn with_permissions(policy: Policy, permissions: Vec<Permission>) -> Self {
        Self {
            permissions: Some(permissions),
            ..Self::summary(policy)
        }
    }
}

/// Single `(resource, resource_type, action)` grant owned by a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub policy_id: PolicyId,
    pub org_id: OrgId,
    pub resource: String,
    pub resource_type: String,
    pub action: String,
    pub created: i64,
    pub updated: i64,
}

/// Association linking one team to one policy within an org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPolicy {
    pub id: i64,
    pub org_id: OrgId,
    pub team_id: TeamId,
    pub policy_id: PolicyId,
    pub created: i64,
    pub updated: i64,
}
