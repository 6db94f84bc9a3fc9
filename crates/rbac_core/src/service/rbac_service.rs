//! RBAC policy use-case service.
//!
//! # Responsibility
//! - Accept command/query values and delegate to repositories.
//! - Normalize and validate caller input above the repository layer.
//! - Emit one metadata-only log event per mutation.
//!
//! # Invariants
//! - Policy names are trimmed, non-blank and at most `MAX_POLICY_NAME_CHARS`.
//! - Policy descriptions and permission `resource` are trimmed; blank is allowed.
//! - Permission `action` and `resource_type` are trimmed and non-blank.
//! - Log events carry ids and error codes only, never names or descriptions.

use crate::model::command::{
    AddTeamPolicyCommand, CreatePermissionCommand, CreatePolicyCommand, DeletePermissionCommand,
    DeletePolicyCommand, GetPolicyPermissionsQuery, GetPolicyQuery, GetTeamPoliciesQuery,
    ListPoliciesQuery, RemoveTeamPolicyCommand,
};
use crate::model::policy::{Permission, Policy, PolicyDetail, TeamPolicy};
use crate::repo::error::{ErrorKind, RbacError, RbacResult};
use crate::repo::policy_repo::PolicyRepository;
use crate::repo::team_policy_repo::TeamPolicyRepository;
use log::{error, info, warn};
use std::error::Error;

/// Upper bound on policy name length, in characters.
pub const MAX_POLICY_NAME_CHARS: usize = 190;

/// RBAC service facade over policy and team-policy repositories.
pub struct RbacService<P: PolicyRepository, T: TeamPolicyRepository> {
    policies: P,
    team_policies: T,
}

impl<P: PolicyRepository, T: TeamPolicyRepository> RbacService<P, T> {
    /// Creates service from repository implementations.
    pub fn new(policies: P, team_policies: T) -> Self {
        Self {
            policies,
            team_policies,
        }
    }

    /// Lists policy summaries of one org.
    pub fn list_policies(&self, query: &ListPoliciesQuery) -> RbacResult<Vec<Policy>> {
        self.policies.list_policies(query.org_id)
    }

    /// Loads one policy with its full permission list.
    pub fn get_policy(&self, query: &GetPolicyQuery) -> RbacResult<PolicyDetail> {
        self.policies.get_policy(query.policy_id, query.org_id)
    }

    /// Creates one policy.
    ///
    /// # Contract
    /// - `name` is trimmed, non-blank and at most `MAX_POLICY_NAME_CHARS`.
    /// - `description` is stored trimmed; blank is allowed.
    pub fn create_policy(&self, cmd: &CreatePolicyCommand) -> RbacResult<Policy> {
        let result = normalize_policy_name(&cmd.name).and_then(|name| {
            self.policies
                .create_policy(cmd.org_id, name.as_str(), cmd.description.trim())
        });
        log_mutation(
            "policy_create",
            || match &result {
                Ok(policy) => format!("org_id={} policy_id={}", cmd.org_id, policy.id),
                Err(_) => format!("org_id={}", cmd.org_id),
            },
            &result,
        );
        result
    }

    /// Deletes one policy with its permissions and team links.
    ///
    /// Deleting a policy that does not exist succeeds.
    pub fn delete_policy(&self, cmd: &DeletePolicyCommand) -> RbacResult<()> {
        let result = self.policies.delete_policy(cmd.id, cmd.org_id);
        log_mutation(
            "policy_delete",
            || format!("org_id={} policy_id={}", cmd.org_id, cmd.id),
            &result,
        );
        result
    }

    /// Lists permissions of one policy, without org scoping.
    pub fn get_policy_permissions(
        &self,
        query: &GetPolicyPermissionsQuery,
    ) -> RbacResult<Vec<Permission>> {
        self.policies.get_policy_permissions(query.policy_id)
    }

    /// Creates one permission under an existing policy of the same org.
    pub fn create_permission(&self, cmd: &CreatePermissionCommand) -> RbacResult<Permission> {
        let result = normalize_required("action", &cmd.action).and_then(|action| {
            let resource_type = normalize_required("resource_type", &cmd.resource_type)?;
            self.policies.create_permission(
                cmd.org_id,
                cmd.policy_id,
                cmd.resource.trim(),
                resource_type.as_str(),
                action.as_str(),
            )
        });
        log_mutation(
            "permission_create",
            || match &result {
                Ok(permission) => format!(
                    "org_id={} policy_id={} permission_id={}",
                    cmd.org_id, cmd.policy_id, permission.id
                ),
                Err(_) => format!("org_id={} policy_id={}", cmd.org_id, cmd.policy_id),
            },
            &result,
        );
        result
    }

    /// Deletes one permission. Deleting a missing permission succeeds.
    pub fn delete_permission(&self, cmd: &DeletePermissionCommand) -> RbacResult<()> {
        let result = self.policies.delete_permission(cmd.id, cmd.org_id);
        log_mutation(
            "permission_delete",
            || format!("org_id={} permission_id={}", cmd.org_id, cmd.id),
            &result,
        );
        result
    }

    /// Lists policy summaries linked to a team.
    pub fn get_team_policies(&self, query: &GetTeamPoliciesQuery) -> RbacResult<Vec<PolicyDetail>> {
        self.team_policies
            .list_team_policies(query.team_id, query.org_id)
    }

    /// Links a team to a policy of the same org.
    ///
    /// # Contract
    /// - Fails with `TeamPolicyAlreadyExists` before checking that either end exists.
    /// - Then fails with `TeamNotFound` or `PolicyNotFound`, in that order.
    pub fn add_team_policy(&self, cmd: &AddTeamPolicyCommand) -> RbacResult<TeamPolicy> {
        let result = self
            .team_policies
            .add_team_policy(cmd.org_id, cmd.team_id, cmd.policy_id);
        log_mutation(
            "team_policy_add",
            || {
                format!(
                    "org_id={} team_id={} policy_id={}",
                    cmd.org_id, cmd.team_id, cmd.policy_id
                )
            },
            &result,
        );
        result
    }

    /// Removes a link. Fails with `TeamPolicyNotFound` when none exists.
    pub fn remove_team_policy(&self, cmd: &RemoveTeamPolicyCommand) -> RbacResult<()> {
        let result = self
            .team_policies
            .remove_team_policy(cmd.org_id, cmd.team_id, cmd.policy_id);
        log_mutation(
            "team_policy_remove",
            || {
                format!(
                    "org_id={} team_id={} policy_id={}",
                    cmd.org_id, cmd.team_id, cmd.policy_id
                )
            },
            &result,
        );
        result
    }
}

/// Trims a policy name and enforces the name contract.
pub fn normalize_policy_name(name: &str) -> RbacResult<String> {
    let normalized = normalize_required("name", name)?;
    if normalized.chars().count() > MAX_POLICY_NAME_CHARS {
        return Err(RbacError::InvalidInput(format!(
            "name must be at most {MAX_POLICY_NAME_CHARS} characters"
        )));
    }
    Ok(normalized)
}

fn normalize_required(field: &str, value: &str) -> RbacResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RbacError::InvalidInput(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

fn log_mutation<T>(event: &str, fields: impl FnOnce() -> String, result: &RbacResult<T>) {
    match result {
        Ok(_) => info!("event={event} module=rbac status=ok {}", fields()),
        Err(err) if err.kind() == ErrorKind::Storage => error!(
            "event={event} module=rbac status=error {} error_code={} error={}",
            fields(),
            err.code(),
            err.source()
                .map_or_else(|| err.code().to_string(), ToString::to_string)
        ),
        Err(err) => warn!(
            "event={event} module=rbac status=error {} error_code={}",
            fields(),
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_policy_name, MAX_POLICY_NAME_CHARS};
    use crate::repo::error::RbacError;

    #[test]
    fn policy_name_is_trimmed() {
        assert_eq!(
            normalize_policy_name("  viewers \n").expect("name should normalize"),
            "viewers"
        );
    }

    #[test]
    fn blank_policy_name_is_rejected() {
        let err = normalize_policy_name(" \t ").expect_err("blank name must fail");
        assert!(matches!(err, RbacError::InvalidInput(message) if message.contains("name")));
    }

    #[test]
    fn overlong_policy_name_is_rejected() {
        let name = "x".repeat(MAX_POLICY_NAME_CHARS + 1);
        assert!(normalize_policy_name(&name).is_err());
        assert!(normalize_policy_name(&name[1..]).is_ok());
    }
}
