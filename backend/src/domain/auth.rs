//! Bearer access tokens presented by API clients.
//!
//! Tokens are issued by an external sign-in service. This crate only stores
//! their SHA-256 fingerprints, so the raw token never reaches the database and
//! is wiped from memory once the request is done with it.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Maximum accepted token length.
pub const ACCESS_TOKEN_MAX: usize = 512;

/// Validation errors for bearer tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessTokenValidationError {
    /// Token was blank.
    #[error("access token must not be empty")]
    Empty,
    /// Token was too long or contained whitespace.
    #[error("access token is malformed")]
    Malformed,
}

/// Raw bearer token held in zeroising storage.
///
/// # Examples
/// ```
/// use pantry::domain::AccessToken;
///
/// let token = AccessToken::new("s3cr3t").expect("valid token");
/// assert_eq!(token.fingerprint().len(), 64);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Validate a raw token string.
    pub fn new(raw: &str) -> Result<Self, AccessTokenValidationError> {
        if raw.is_empty() {
            return Err(AccessTokenValidationError::Empty);
        }
        if raw.len() > ACCESS_TOKEN_MAX || raw.chars().any(char::is_whitespace) {
            return Err(AccessTokenValidationError::Malformed);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Raw token value.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Lower-case hex SHA-256 digest used as the lookup key.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(**redacted**)")
    }
}
