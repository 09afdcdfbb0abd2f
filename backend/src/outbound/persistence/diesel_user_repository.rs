//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{PersonName, PhoneNumber, User, UserId};

use super::diesel_helpers::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

pub(crate) fn row_to_user(row: UserRow) -> Result<User, String> {
    Ok(User {
        id: UserId::new(row.id),
        name: PersonName::new(&row.name).map_err(|err| format!("user {}: {err}", row.id))?,
        phone: PhoneNumber::new(&row.phone).map_err(|err| format!("user {}: {err}", row.id))?,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(user_id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn upsert_by_phone(&self, candidate: &User) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewUserRow {
            id: *candidate.id.as_uuid(),
            name: candidate.name.as_ref(),
            phone: candidate.phone.as_ref(),
        };
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .on_conflict(users::phone)
            .do_update()
            .set(users::phone.eq(excluded(users::phone)))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_user(row).map_err(UserRepositoryError::query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let mapped = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(mapped, UserRepositoryError::Connection { .. }));
        assert!(mapped.to_string().contains("connection refused"));
    }

    #[rstest]
    fn corrupt_phone_is_reported() {
        let row = UserRow {
            id: Uuid::nil(),
            name: "Ada".to_owned(),
            phone: "12".to_owned(),
        };
        let err = row_to_user(row).expect_err("phone too short");
        assert!(err.contains("7 to 15 digits"));
    }
}
