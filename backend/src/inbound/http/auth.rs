//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers take an [`AuthenticatedUser`] argument; the extractor reads the
//! `Authorization: Bearer <token>` header and resolves it through the
//! [`TokenVerifier`](crate::domain::ports::TokenVerifier) held in
//! [`HttpState`]. Handlers never see the raw token.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::ports::TokenVerifierError;
use crate::domain::{AccessToken, Error, UserId};

use super::state::HttpState;

const BEARER_SCHEME: &str = "bearer";

/// The user behind a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(UserId);

impl AuthenticatedUser {
    /// Identifier of the authenticated user.
    pub fn user_id(&self) -> &UserId {
        &self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Result<AccessToken, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| Error::unauthorized("malformed authorization header"))?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(Error::unauthorized("unsupported authorization scheme"));
    }
    AccessToken::new(token.trim()).map_err(|_| Error::unauthorized("malformed bearer token"))
}

fn map_verifier_error(error: TokenVerifierError) -> Error {
    match error {
        TokenVerifierError::Connection { message } => Error::service_unavailable(message),
        TokenVerifierError::Query { message } => Error::internal(message),
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let token = token?;
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            match state.tokens.verify(&token).await.map_err(map_verifier_error)? {
                Some(user_id) => Ok(Self(user_id)),
                None => {
                    debug!("bearer token rejected");
                    Err(Error::unauthorized("invalid or expired access token"))
                }
            }
        })
    }
}
