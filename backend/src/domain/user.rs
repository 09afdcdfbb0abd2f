//! User identity as seen by the family directory.
//!
//! Users are created either by the external sign-in flow or implicitly when an
//! owner or admin adds a member by phone number. The phone number is the
//! natural key used for that lookup.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::identifier::define_identifier;

define_identifier! {
    /// Stable user identifier.
    UserId
}

/// Minimum number of digits accepted in a phone number.
pub const PHONE_DIGITS_MIN: usize = 7;
/// Maximum number of digits accepted in a phone number (E.164 limit).
pub const PHONE_DIGITS_MAX: usize = 15;
/// Maximum length of a person's display name.
pub const PERSON_NAME_MAX: usize = 50;

/// Validation errors for user value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Phone number was blank.
    #[error("phone number must not be empty")]
    EmptyPhone,
    /// Phone number contained unexpected characters or the wrong digit count.
    #[error("phone number must contain 7 to 15 digits")]
    InvalidPhone,
    /// Name was blank.
    #[error("name must not be empty")]
    EmptyName,
    /// Name exceeded the maximum length.
    #[error("name must be at most {max} characters")]
    NameTooLong {
        /// Maximum permitted characters.
        max: usize,
    },
}

/// Phone number normalised to an optional leading `+` followed by digits.
///
/// Spaces, dashes, dots and parentheses are accepted on input and stripped.
///
/// # Examples
/// ```
/// use pantry::domain::PhoneNumber;
///
/// let phone = PhoneNumber::new("+1 (555) 010-9999").expect("valid phone");
/// assert_eq!(phone.as_ref(), "+15550109999");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "+15550109999")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate and normalise a phone number.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyPhone);
        }

        let (plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => ("+", rest),
            None => ("", trimmed),
        };
        let mut digits = String::with_capacity(rest.len());
        for ch in rest.chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(UserValidationError::InvalidPhone),
            }
        }
        if !(PHONE_DIGITS_MIN..=PHONE_DIGITS_MAX).contains(&digits.len()) {
            return Err(UserValidationError::InvalidPhone);
        }
        Ok(Self(format!("{plus}{digits}")))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A person's display name, trimmed and bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "Alex")]
pub struct PersonName(String);

impl PersonName {
    /// Validate and construct a [`PersonName`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if trimmed.chars().count() > PERSON_NAME_MAX {
            return Err(UserValidationError::NameTooLong {
                max: PERSON_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PersonName> for String {
    fn from(value: PersonName) -> Self {
        value.0
    }
}

impl TryFrom<String> for PersonName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Display name.
    pub name: PersonName,
    /// Normalised phone number.
    pub phone: PhoneNumber,
}
