//! RBAC domain model.
//!
//! # Responsibility
//! - Define persisted records for policies, permissions and team links.
//! - Define the command/query values accepted by the service layer.
//!
//! # Invariants
//! - Every record is scoped to exactly one organization (`org_id`).
//! - A policy owns its permissions; team links reference teams and policies
//!   without owning either.

pub mod command;
pub mod policy;
