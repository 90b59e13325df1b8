//! Database error types

use std::fmt;

use crate::error::{AppError, AppErrorKind};

#[derive(Debug, Clone)]
pub enum DatabaseErrorKind {
    /// Query expected a row and got none
    NotFound,
    /// A UNIQUE constraint rejected the write
    UniqueViolation { constraint: Option<String> },
    /// Pool exhausted, closed, or the server is unreachable
    ConnectionError { message: String },
    /// Migration could not be applied
    MigrationError { message: String },
    Unknown { message: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseError {
    pub kind: DatabaseErrorKind,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind) -> Self {
        Self { kind }
    }

    pub fn from_sqlx(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::RowNotFound => DatabaseErrorKind::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseErrorKind::UniqueViolation {
                    constraint: db_err.constraint().map(str::to_string),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseErrorKind::ConnectionError {
                    message: err.to_string(),
                }
            }
            _ => DatabaseErrorKind::Unknown {
                message: err.to_string(),
            },
        };

        Self { kind }
    }

    pub fn from_migrate(err: sqlx::migrate::MigrateError) -> Self {
        Self::new(DatabaseErrorKind::MigrationError {
            message: err.to_string(),
        })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::UniqueViolation { .. })
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DatabaseErrorKind::NotFound => write!(f, "Record not found"),
            DatabaseErrorKind::UniqueViolation { constraint } => match constraint {
                Some(name) => write!(f, "Unique constraint violated: {}", name),
                None => write!(f, "Unique constraint violated"),
            },
            DatabaseErrorKind::ConnectionError { message } => {
                write!(f, "Database connection error: {}", message)
            }
            DatabaseErrorKind::MigrationError { message } => {
                write!(f, "Database migration error: {}", message)
            }
            DatabaseErrorKind::Unknown { message } => write!(f, "Database error: {}", message),
        }
    }
}

impl std::error::Error for DatabaseError {}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        // The storage-level constraint backs up the pre-insert name check.
        if err.is_unique_violation() {
            return AppError::duplicate();
        }

        AppError::new(AppErrorKind::Database {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DatabaseError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(err.kind, DatabaseErrorKind::NotFound));
    }

    #[test]
    fn test_pool_timeout_is_connection_error() {
        let err = DatabaseError::from_sqlx(sqlx::Error::PoolTimedOut);
        assert!(matches!(err.kind, DatabaseErrorKind::ConnectionError { .. }));

        let app_error: AppError = err.into();
        assert_eq!(app_error.status_code(), 500);
        assert!(app_error.detail().contains("connection"));
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let err = DatabaseError::new(DatabaseErrorKind::UniqueViolation {
            constraint: Some("credit_packages_name_key".to_string()),
        });

        let app_error: AppError = err.into();
        assert_eq!(app_error.status_code(), 409);
        assert_eq!(app_error.user_message(), "duplicate data");
    }
}
