//! Command and query values accepted by [`crate::RbacService`].
//!
//! Each value carries the org scope plus the fields one operation needs.
//! Results are returned by the service call rather than written back into
//! the value.

use crate::model::policy::{OrgId, PermissionId, PolicyId, TeamId};
use serde::{Deserialize, Serialize};

/// Lists every policy of one org.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPoliciesQuery {
    pub org_id: OrgId,
}

/// Loads one policy of an org with its permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPolicyQuery {
    pub policy_id: PolicyId,
    pub org_id: OrgId,
}

/// Creates a policy; `description` defaults to empty when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePolicyCommand {
    pub org_id: OrgId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Deletes a policy with its permissions and team links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePolicyCommand {
    pub id: PolicyId,
    pub org_id: OrgId,
}

/// Lists permissions of one policy. Not org-scoped; callers must have
/// authorized access to `policy_id` beforehand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPolicyPermissionsQuery {
    pub policy_id: PolicyId,
}

/// Grants `action` on `resource` of `resource_type` under one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePermissionCommand {
    pub org_id: OrgId,
    pub policy_id: PolicyId,
    pub resource: String,
    pub resource_type: String,
    pub action: String,
}

/// Deletes one permission of an org.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePermissionCommand {
    pub id: PermissionId,
    pub org_id: OrgId,
}

/// Lists policies linked to one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTeamPoliciesQuery {
    pub team_id: TeamId,
    pub org_id: OrgId,
}

/// Links a team to a policy; both must belong to `org_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTeamPolicyCommand {
    pub org_id: OrgId,
    pub team_id: TeamId,
    pub policy_id: PolicyId,
}

/// Removes an existing team-policy link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveTeamPolicyCommand {
    pub org_id: OrgId,
    pub team_id: TeamId,
    pub policy_id: PolicyId,
}
