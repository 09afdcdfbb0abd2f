//! Port resolving bearer tokens to users.

use async_trait::async_trait;

use crate::domain::{AccessToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised while verifying tokens.
    pub enum TokenVerifierError {
        /// Token store connection could not be established.
        Connection { message: String } =>
            "token store connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } =>
            "token lookup failed: {message}",
    }
}

/// Port for resolving an access token to the user it was issued to.
///
/// Unknown, revoked and expired tokens all resolve to `None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolve `token`.
    async fn verify(&self, token: &AccessToken) -> Result<Option<UserId>, TokenVerifierError>;
}

/// Fixture verifier for local runs: a token that parses as a UUID
/// authenticates as that user id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTokenVerifier;

#[async_trait]
impl TokenVerifier for FixtureTokenVerifier {
    async fn verify(&self, token: &AccessToken) -> Result<Option<UserId>, TokenVerifierError> {
        Ok(token.expose().parse::<UserId>().ok())
    }
}
