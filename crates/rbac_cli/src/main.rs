//! CLI inspection entry point.
//!
//! # Responsibility
//! - Verify `rbac_core` linkage (`ping`).
//! - Print read-only policy queries from an existing database file as JSON.
//!
//! # Invariants
//! - Database files are opened read-only; a missing file is an error, never
//!   created.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rbac_core::db::open_db_read_only;
use rbac_core::{
    default_log_level, init_logging, GetPolicyQuery, GetTeamPoliciesQuery, ListPoliciesQuery,
    OrgId, PolicyId, RbacService, SqlitePolicyRepository, SqliteTeamPolicyRepository, TeamId,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rbac_cli", version, about = "Inspect policies stored in an RBAC database")]
struct Cli {
    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, global = true, env = "RBAC_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level: trace, debug, info, warn or error.
    #[arg(long, global = true, env = "RBAC_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that rbac_core is linked and print its version
    Ping,
    /// List the policies of one org
    Policies { db_path: PathBuf, org_id: OrgId },
    /// Show one policy with its permissions
    Policy {
        db_path: PathBuf,
        org_id: OrgId,
        policy_id: PolicyId,
    },
    /// List the policies linked to one team
    TeamPolicies {
        db_path: PathBuf,
        org_id: OrgId,
        team_id: TeamId,
    },
}

type Service<'conn> =
    RbacService<SqlitePolicyRepository<'conn>, SqliteTeamPolicyRepository<'conn>>;

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .unwrap_or_else(|| default_log_level().as_str().to_string());
        init_logging(&level, log_dir).context("failed to initialize logging")?;
    }

    match cli.command {
        Command::Ping => Ok(format!(
            "rbac_core ping={} version={}",
            rbac_core::ping(),
            rbac_core::core_version()
        )),
        Command::Policies { db_path, org_id } => {
            let conn = open_store(&db_path)?;
            let policies = open_service(&conn)?.list_policies(&ListPoliciesQuery { org_id })?;
            Ok(serde_json::to_string_pretty(&policies)?)
        }
        Command::Policy {
            db_path,
            org_id,
            policy_id,
        } => {
            let conn = open_store(&db_path)?;
            let policy =
                open_service(&conn)?.get_policy(&GetPolicyQuery { policy_id, org_id })?;
            Ok(serde_json::to_string_pretty(&policy)?)
        }
        Command::TeamPolicies {
            db_path,
            org_id,
            team_id,
        } => {
            let conn = open_store(&db_path)?;
            let policies =
                open_service(&conn)?.get_team_policies(&GetTeamPoliciesQuery { team_id, org_id })?;
            Ok(serde_json::to_string_pretty(&policies)?)
        }
    }
}

fn open_store(path: &Path) -> Result<Connection> {
    open_db_read_only(path).with_context(|| format!("cannot inspect `{}`", path.display()))
}

fn open_service(conn: &Connection) -> Result<Service<'_>> {
    Ok(RbacService::new(
        SqlitePolicyRepository::try_new(conn)?,
        SqliteTeamPolicyRepository::try_new(conn)?,
    ))
}
