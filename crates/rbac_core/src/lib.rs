//! Persistence core for the RBAC policy model.
//! This crate is the single source of truth for policy, permission and
//! team-policy integrity rules.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::command::{
    AddTeamPolicyCommand, CreatePermissionCommand, CreatePolicyCommand, DeletePermissionCommand,
    DeletePolicyCommand, GetPolicyPermissionsQuery, GetPolicyQuery, GetTeamPoliciesQuery,
    ListPoliciesQuery, RemoveTeamPolicyCommand,
};
pub use model::policy::{
    OrgId, Permission, PermissionId, Policy, PolicyDetail, PolicyId, TeamId, TeamPolicy,
};
pub use repo::error::{ErrorKind, RbacError, RbacResult};
pub use repo::policy_repo::{PolicyRepository, SqlitePolicyRepository};
pub use repo::team_policy_repo::{SqliteTeamPolicyRepository, TeamPolicyRepository};
pub use service::rbac_service::{normalize_policy_name, RbacService, MAX_POLICY_NAME_CHARS};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
