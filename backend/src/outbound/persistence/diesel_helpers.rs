//! Shared helpers for Diesel repository implementations.
//!
//! Each adapter maps failures into its own port error, so the helpers here
//! take constructor closures instead of naming a concrete error type.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use pagination::PageRequest;
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
pub(crate) fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
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
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// Name of the constraint behind a unique violation, or `None` for any
/// other error. Violations without a reported constraint yield `Some("")`.
pub(crate) fn unique_violation(error: &DieselError) -> Option<&str> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name().unwrap_or_default())
        }
        _ => None,
    }
}

/// Convert a domain quantity into the `INTEGER` column type.
pub(crate) fn quantity_to_db(quantity: u32) -> Result<i32, String> {
    i32::try_from(quantity).map_err(|_| format!("quantity {quantity} exceeds column range"))
}

/// Convert a stored quantity into the domain type.
pub(crate) fn quantity_from_db(quantity: i32) -> Result<u32, String> {
    u32::try_from(quantity).map_err(|_| format!("negative quantity {quantity} in storage"))
}

/// Convert a `COUNT(*)` result into the domain type.
pub(crate) fn count_from_db(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// `LIMIT` and `OFFSET` values for a page request.
pub(crate) fn page_window(page: PageRequest) -> (i64, i64) {
    let limit = i64::from(page.limit());
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub(crate) fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}
