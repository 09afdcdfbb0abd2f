//! Family tenancy model: families, their settings, and member roles.
//!
//! A family is the tenant boundary. Every inventory item, merchant, order and
//! notification belongs to exactly one family, and a user holds at most one
//! active membership at a time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::identifier::define_identifier;
use super::user::{PersonName, PhoneNumber, UserId};

define_identifier! {
    /// Stable family identifier.
    FamilyId
}

/// Length of a generated invite code.
pub const INVITE_CODE_LEN: usize = 6;
/// Alphabet invite codes are drawn from.
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Maximum length of a family display name.
pub const FAMILY_NAME_MAX: usize = 50;
/// Upper bound for the expiry warning window, in days.
pub const EXPIRY_WARNING_DAYS_MAX: u32 = 30;
/// Upper bound for the low-stock threshold.
pub const LOW_STOCK_THRESHOLD_MAX: u32 = 1_000;

/// Validation errors for family value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FamilyValidationError {
    /// Family name was blank.
    #[error("family name must not be empty")]
    EmptyName,
    /// Family name exceeded the maximum length.
    #[error("family name must be at most {max} characters")]
    NameTooLong {
        /// Maximum permitted characters.
        max: usize,
    },
    /// Invite code was not six letters or digits.
    #[error("invite code must be 6 letters or digits")]
    InvalidInviteCode,
    /// Expiry warning window exceeded the maximum.
    #[error("expiry warning days must be at most {max}")]
    ExpiryWarningTooLong {
        /// Maximum permitted days.
        max: u32,
    },
    /// Low-stock threshold exceeded the maximum.
    #[error("low stock threshold must be at most {max}")]
    ThresholdTooHigh {
        /// Maximum permitted threshold.
        max: u32,
    },
    /// Role string was not recognised.
    #[error("unknown family role: {value}")]
    UnknownRole {
        /// Rejected input.
        value: String,
    },
}

/// Display name of a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "The Okafors")]
pub struct FamilyName(String);

impl FamilyName {
    /// Validate and construct a [`FamilyName`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, FamilyValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FamilyValidationError::EmptyName);
        }
        if trimmed.chars().count() > FAMILY_NAME_MAX {
            return Err(FamilyValidationError::NameTooLong {
                max: FAMILY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for FamilyName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<FamilyName> for String {
    fn from(value: FamilyName) -> Self {
        value.0
    }
}

impl TryFrom<String> for FamilyName {
    type Error = FamilyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Six character code used to join a family.
///
/// Input is trimmed and upper-cased before validation, so codes are typed
/// case-insensitively.
///
/// # Examples
/// ```
/// use pantry::domain::InviteCode;
///
/// let code = InviteCode::parse(" ab12cd ").expect("valid code");
/// assert_eq!(code.as_ref(), "AB12CD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "K7Q2ZP")]
pub struct InviteCode(String);

impl InviteCode {
    /// Draw a fresh random code from [`INVITE_CODE_ALPHABET`].
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..INVITE_CODE_LEN)
            .filter_map(|_| INVITE_CODE_ALPHABET.choose(&mut *rng))
            .map(|byte| char::from(*byte))
            .collect();
        Self(code)
    }

    /// Validate user input.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, FamilyValidationError> {
        let normalised = raw.as_ref().trim().to_ascii_uppercase();
        let valid = normalised.len() == INVITE_CODE_LEN
            && normalised.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b));
        if !valid {
            return Err(FamilyValidationError::InvalidInviteCode);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for InviteCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<InviteCode> for String {
    fn from(value: InviteCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for InviteCode {
    type Error = FamilyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Per-family preferences driving notifications and stock classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilySettings {
    /// Notify when an item drops to the low-stock threshold.
    pub notify_low_stock: bool,
    /// Notify about expiring and expired items.
    pub notify_expiry: bool,
    /// Notify when a new item is added.
    pub notify_new_items: bool,
    /// Notify when orders are created or completed.
    pub notify_orders: bool,
    /// Notify when a member joins.
    pub notify_members: bool,
    /// Items with quantity at or below this value are low stock.
    pub low_stock_threshold: u32,
    /// Items expiring within this many days are flagged as expiring.
    pub expiry_warning_days: u32,
}

impl Default for FamilySettings {
    fn default() -> Self {
        Self {
            notify_low_stock: true,
            notify_expiry: true,
            notify_new_items: true,
            notify_orders: true,
            notify_members: true,
            low_stock_threshold: 1,
            expiry_warning_days: 2,
        }
    }
}

/// Partial settings update. Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilySettingsPatch {
    /// See [`FamilySettings::notify_low_stock`].
    pub notify_low_stock: Option<bool>,
    /// See [`FamilySettings::notify_expiry`].
    pub notify_expiry: Option<bool>,
    /// See [`FamilySettings::notify_new_items`].
    pub notify_new_items: Option<bool>,
    /// See [`FamilySettings::notify_orders`].
    pub notify_orders: Option<bool>,
    /// See [`FamilySettings::notify_members`].
    pub notify_members: Option<bool>,
    /// See [`FamilySettings::low_stock_threshold`].
    pub low_stock_threshold: Option<u32>,
    /// See [`FamilySettings::expiry_warning_days`].
    pub expiry_warning_days: Option<u32>,
}

impl FamilySettingsPatch {
    /// Apply the patch on top of `current`, validating numeric bounds.
    pub fn apply(
        &self,
        current: FamilySettings,
    ) -> Result<FamilySettings, FamilyValidationError> {
        let settings = FamilySettings {
            notify_low_stock: self.notify_low_stock.unwrap_or(current.notify_low_stock),
            notify_expiry: self.notify_expiry.unwrap_or(current.notify_expiry),
            notify_new_items: self.notify_new_items.unwrap_or(current.notify_new_items),
            notify_orders: self.notify_orders.unwrap_or(current.notify_orders),
            notify_members: self.notify_members.unwrap_or(current.notify_members),
            low_stock_threshold: self
                .low_stock_threshold
                .unwrap_or(current.low_stock_threshold),
            expiry_warning_days: self
                .expiry_warning_days
                .unwrap_or(current.expiry_warning_days),
        };
        if settings.expiry_warning_days > EXPIRY_WARNING_DAYS_MAX {
            return Err(FamilyValidationError::ExpiryWarningTooLong {
                max: EXPIRY_WARNING_DAYS_MAX,
            });
        }
        if settings.low_stock_threshold > LOW_STOCK_THRESHOLD_MAX {
            return Err(FamilyValidationError::ThresholdTooHigh {
                max: LOW_STOCK_THRESHOLD_MAX,
            });
        }
        Ok(settings)
    }
}

/// Privileged actions gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Add a member to the family.
    AddMember,
    /// Remove a member from the family.
    RemoveMember,
    /// Change family settings.
    UpdateSettings,
}

const MANAGER_CAPABILITIES: &[Capability] = &[
    Capability::AddMember,
    Capability::RemoveMember,
    Capability::UpdateSettings,
];

/// Role a member holds within their family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FamilyRole {
    /// Creator of the family. Cannot leave or be removed.
    Owner,
    /// Trusted member who can manage membership and settings.
    Admin,
    /// Regular member.
    Member,
}

impl FamilyRole {
    /// Capabilities granted by this role.
    ///
    /// # Examples
    /// ```
    /// use pantry::domain::{Capability, FamilyRole};
    ///
    /// assert!(FamilyRole::Admin.can(Capability::UpdateSettings));
    /// assert!(!FamilyRole::Member.can(Capability::AddMember));
    /// ```
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Owner | Self::Admin => MANAGER_CAPABILITIES,
            Self::Member => &[],
        }
    }

    /// Whether the role grants `capability`.
    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Whether this role may remove a member holding `target`.
    ///
    /// Owners are never removable; only the owner may remove an admin.
    pub fn can_remove(self, target: FamilyRole) -> bool {
        if !self.can(Capability::RemoveMember) {
            return false;
        }
        match target {
            Self::Owner => false,
            Self::Admin => self == Self::Owner,
            Self::Member => true,
        }
    }

    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for FamilyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FamilyRole {
    type Err = FamilyValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(FamilyValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// Family record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    /// Stable identifier.
    pub id: FamilyId,
    /// Display name.
    pub name: FamilyName,
    /// Code other users enter to join.
    pub invite_code: InviteCode,
    /// User who created the family.
    pub owner_id: UserId,
    /// Notification and stock preferences.
    pub settings: FamilySettings,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// An active member of a family together with their user details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    /// Member's user identifier.
    pub user_id: UserId,
    /// Family the member belongs to.
    pub family_id: FamilyId,
    /// Role held.
    pub role: FamilyRole,
    /// Member's display name.
    pub name: PersonName,
    /// Member's phone number.
    pub phone: PhoneNumber,
    /// When the membership started.
    pub joined_at: DateTime<Utc>,
}

/// Resolved tenancy of a caller: their family, role and the family settings.
///
/// Every tenant-scoped operation starts from one of these so that the family
/// id is always derived from the caller rather than supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Caller.
    pub user_id: UserId,
    /// Caller's family.
    pub family_id: FamilyId,
    /// Caller's role in that family.
    pub role: FamilyRole,
    /// Settings of that family at resolution time.
    pub settings: FamilySettings,
}

impl Membership {
    /// Whether the caller's role grants `capability`.
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }
}
