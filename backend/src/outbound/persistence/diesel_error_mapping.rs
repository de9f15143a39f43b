//! Classification of Diesel and pool failures shared by the repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Adapter-neutral outcome of a failed Diesel call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    Connection(&'static str),
    Query(&'static str),
    /// Unique constraint violated; carries the constraint name when reported.
    UniqueViolation { constraint: Option<String> },
}

pub(crate) fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error")
        }
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            DieselFailure::Query("referenced row does not exist")
        }
        _ => DieselFailure::Query("database error"),
    }
}
