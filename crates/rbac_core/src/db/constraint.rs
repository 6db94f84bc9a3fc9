//! Classification of SQLite constraint failures.
//!
//! SQLite reports unique violations as `SQLITE_CONSTRAINT_UNIQUE` with a
//! message of the form `UNIQUE constraint failed: policy.org_id, policy.name`.
//! Callers use the reported column list to decide which domain error applies.

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::ffi;

static UNIQUE_FAILED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"UNIQUE constraint failed: (?P<columns>[\w.]+(?:,\s*[\w.]+)*)")
        .expect("unique constraint pattern is valid")
});

/// Returns whether `err` is a uniqueness-constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || inner.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Returns the unqualified column names named by a uniqueness violation.
///
/// Returns `None` when `err` is not a uniqueness violation or carries no
/// message. Table prefixes are stripped (`policy.name` -> `name`).
pub fn unique_violation_columns(err: &rusqlite::Error) -> Option<Vec<String>> {
    if !is_unique_violation(err) {
        return None;
    }

    let message = match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.as_str(),
        _ => return None,
    };

    let captures = UNIQUE_FAILED_RE.captures(message)?;
    let columns = captures
        .name("columns")?
        .as_str()
        .split(',')
        .map(|column| {
            let column = column.trim();
            column
                .rsplit_once('.')
                .map_or(column, |(_, name)| name)
                .to_string()
        })
        .collect();
    Some(columns)
}

/// Returns whether `err` is a uniqueness violation that names `column`.
pub fn unique_violation_on(err: &rusqlite::Error, column: &str) -> bool {
    unique_violation_columns(err)
        .is_some_and(|columns| columns.iter().any(|name| name == column))
}

#[cfg(test)]
mod tests {
    use super::{is_unique_violation, unique_violation_columns, unique_violation_on};
    use rusqlite::ffi;

    fn sqlite_failure(extended_code: i32, message: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(extended_code), Some(message.to_string()))
    }

    #[test]
    fn parses_multi_column_violation() {
        let err = sqlite_failure(
            ffi::SQLITE_CONSTRAINT_UNIQUE,
            "UNIQUE constraint failed: policy.org_id, policy.name",
        );

        assert!(is_unique_violation(&err));
        assert_eq!(
            unique_violation_columns(&err).expect("columns should parse"),
            vec!["org_id".to_string(), "name".to_string()]
        );
        assert!(unique_violation_on(&err, "name"));
        assert!(!unique_violation_on(&err, "uid"));
    }

    #[test]
    fn ignores_other_constraint_failures() {
        let err = sqlite_failure(
            ffi::SQLITE_CONSTRAINT_NOTNULL,
            "NOT NULL constraint failed: policy.name",
        );

        assert!(!is_unique_violation(&err));
        assert_eq!(unique_violation_columns(&err), None);
        assert!(!unique_violation_on(&err, "name"));
    }

    #[test]
    fn ignores_non_sqlite_errors() {
        assert!(!is_unique_violation(&rusqlite::Error::QueryReturnedNoRows));
    }
}
