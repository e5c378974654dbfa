//! Shared Diesel error mapping for the repositories.
//!
//! Every repository here has the same basic query semantics, so the mapping
//! into [`RepositoryError`] lives in one place: pool failures become
//! connection errors, unique violations become duplicates (named by the
//! caller, since only the call site knows which constraint it raced), and
//! everything else becomes a query error.

use tracing::debug;

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

/// Map pool errors into [`RepositoryError::Connection`].
pub(crate) fn map_pool_error(error: PoolError) -> RepositoryError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    RepositoryError::connection(message)
}

/// Map Diesel errors for plain queries (no uniqueness expectations).
pub(crate) fn map_query_error(error: diesel::result::Error) -> RepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

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
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RepositoryError::connection("database connection error")
        }
        DieselError::NotFound => RepositoryError::query("record not found"),
        _ => RepositoryError::query("database error"),
    }
}

/// Map Diesel errors for inserts guarded by a uniqueness constraint.
///
/// `entity` names the constraint for [`RepositoryError::Duplicate`]; partial
/// unique indexes (per-post likes and bookmarks) surface here the same way
/// as plain unique indexes.
pub(crate) fn map_insert_error(
    error: diesel::result::Error,
    entity: &'static str,
) -> RepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) = &error {
        return RepositoryError::duplicate(entity);
    }
    map_query_error(error)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let err = map_pool_error(PoolError::checkout("refused"));
        assert!(matches!(err, RepositoryError::Connection { .. }));
        assert!(err.to_string().contains("refused"));
    }

    #[rstest]
    fn unique_violations_become_duplicates() {
        let diesel_err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(
            map_insert_error(diesel_err, "like"),
            RepositoryError::duplicate("like")
        );
    }

    #[rstest]
    fn not_found_becomes_a_query_error() {
        let err = map_query_error(diesel::result::Error::NotFound);
        assert!(matches!(err, RepositoryError::Query { .. }));
    }
}
