//! PostgreSQL-backed `TokenVerifier` looking up hashed access tokens.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{TokenVerifier, TokenVerifierError};
use crate::domain::{AccessToken, UserId};

use super::diesel_helpers::{map_basic_diesel_error, map_basic_pool_error};
use super::models::AccessTokenRow;
use super::pool::DbPool;
use super::schema::access_tokens;

/// Resolves bearer tokens by their SHA-256 fingerprint.
#[derive(Clone)]
pub struct DieselTokenVerifier {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselTokenVerifier {
    /// Create a verifier over `pool`, judging expiry with `clock`.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl TokenVerifier for DieselTokenVerifier {
    async fn verify(&self, token: &AccessToken) -> Result<Option<UserId>, TokenVerifierError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, TokenVerifierError::connection))?;
        let row: Option<AccessTokenRow> = access_tokens::table
            .find(token.fingerprint())
            .select(AccessTokenRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_basic_diesel_error(
                    err,
                    TokenVerifierError::query,
                    TokenVerifierError::connection,
                )
            })?;

        let Some(row) = row else {
            return Ok(None);
        };
        if row.revoked_at.is_some() {
            debug!(user_id = %row.user_id, "rejecting revoked token");
            return Ok(None);
        }
        if row.expires_at.is_some_and(|at| at <= self.clock.utc()) {
            debug!(user_id = %row.user_id, "rejecting expired token");
            return Ok(None);
        }
        Ok(Some(UserId::new(row.user_id)))
    }
}
