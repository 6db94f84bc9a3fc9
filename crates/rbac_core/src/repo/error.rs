//! Error type shared by RBAC repositories and the service facade.
//!
//! # Invariants
//! - Not-found and already-exists conditions carry the scoped ids that
//!   triggered them.
//! - Storage failures are never swallowed; they carry the underlying
//!   `DbError` plus a context string naming the offending id or name.

use crate::db::DbError;
use crate::model::policy::{OrgId, PolicyId, TeamId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RbacResult<T> = Result<T, RbacError>;

/// Coarse classification of [`RbacError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidInput,
    Storage,
}

/// Errors from RBAC policy persistence operations.
#[derive(Debug)]
pub enum RbacError {
    /// No policy with this id exists in the org.
    PolicyNotFound { org_id: OrgId, policy_id: PolicyId },
    /// No team with this id exists in the org.
    TeamNotFound { org_id: OrgId, team_id: TeamId },
    /// No link between the team and policy exists in the org.
    TeamPolicyNotFound {
        org_id: OrgId,
        team_id: TeamId,
        policy_id: PolicyId,
    },
    /// Another policy in the org already uses this name.
    DuplicatePolicyName {
        org_id: OrgId,
        name: String,
        source: rusqlite::Error,
    },
    /// The team is already linked to the policy in the org.
    TeamPolicyAlreadyExists {
        org_id: OrgId,
        team_id: TeamId,
        policy_id: PolicyId,
    },
    /// Caller-supplied value was rejected before touching storage.
    InvalidInput(String),
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Unclassified storage failure.
    Storage { context: String, source: DbError },
}

impl RbacError {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PolicyNotFound { .. }
            | Self::TeamNotFound { .. }
            | Self::TeamPolicyNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicatePolicyName { .. } | Self::TeamPolicyAlreadyExists { .. } => {
                ErrorKind::AlreadyExists
            }
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Short stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PolicyNotFound { .. } => "policy_not_found",
            Self::TeamNotFound { .. } => "team_not_found",
            Self::TeamPolicyNotFound { .. } => "team_policy_not_found",
            Self::DuplicatePolicyName { .. } => "duplicate_policy_name",
            Self::TeamPolicyAlreadyExists { .. } => "team_policy_already_exists",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_required_table",
            Self::Storage { .. } => "storage_failure",
        }
    }

    /// Attaches `context` to an unclassified storage failure.
    ///
    /// Domain errors pass through unchanged, and an existing context is kept.
    pub fn with_context(self, context: impl FnOnce() -> String) -> Self {
        match self {
            Self::Storage { context: current, source } if current.is_empty() => Self::Storage {
                context: context(),
                source,
            },
            other => other,
        }
    }
}

impl Display for RbacError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PolicyNotFound { org_id, policy_id } => {
                write!(f, "policy not found: id={policy_id} org_id={org_id}")
            }
            Self::TeamNotFound { org_id, team_id } => {
                write!(f, "team not found: id={team_id} org_id={org_id}")
            }
            Self::TeamPolicyNotFound {
                org_id,
                team_id,
                policy_id,
            } => write!(
                f,
                "team policy not found: team_id={team_id} policy_id={policy_id} org_id={org_id}"
            ),
            Self::DuplicatePolicyName { org_id, name, .. } => write!(
                f,
                "policy with the name '{name}' already exists in org {org_id}"
            ),
            Self::TeamPolicyAlreadyExists {
                org_id,
                team_id,
                policy_id,
            } => write!(
                f,
                "policy {policy_id} is already added to team {team_id} in org {org_id}"
            ),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted rbac data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "rbac repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "rbac repository requires table `{table}`")
            }
            Self::Storage { context, source } if context.is_empty() => write!(f, "{source}"),
            Self::Storage { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl Error for RbacError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicatePolicyName { source, .. } => Some(source),
            Self::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DbError> for RbacError {
    fn from(value: DbError) -> Self {
        Self::Storage {
            context: String::new(),
            source: value,
        }
    }
}

impl From<rusqlite::Error> for RbacError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, RbacError};

    #[test]
    fn with_context_only_touches_bare_storage_errors() {
        let storage = RbacError::from(rusqlite::Error::QueryReturnedNoRows)
            .with_context(|| "create policy `ops` in org 1".to_string());
        assert_eq!(storage.kind(), ErrorKind::Storage);
        assert!(storage
            .to_string()
            .starts_with("create policy `ops` in org 1: "));

        let kept = storage.with_context(|| "outer".to_string());
        assert!(!kept.to_string().contains("outer"));

        let not_found = RbacError::PolicyNotFound {
            org_id: 1,
            policy_id: 2,
        }
        .with_context(|| "ignored".to_string());
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(not_found.to_string(), "policy not found: id=2 org_id=1");
    }

    #[test]
    fn kinds_cover_already_exists_variants() {
        let err = RbacError::TeamPolicyAlreadyExists {
            org_id: 1,
            team_id: 5,
            policy_id: 9,
        };
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(err.code(), "team_policy_already_exists");
    }
}
