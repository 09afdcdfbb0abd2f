//! Port for user lookup and phone-keyed creation.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
    }
}

/// Port for user storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by id.
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Return the user registered under `candidate.phone`, inserting
    /// `candidate` when there is none. Existing users keep their name.
    async fn upsert_by_phone(&self, candidate: &User) -> Result<User, UserRepositoryError>;
}

/// Fixture implementation that echoes candidates back.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, _user_id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn upsert_by_phone(&self, candidate: &User) -> Result<User, UserRepositoryError> {
        Ok(candidate.clone())
    }
}
