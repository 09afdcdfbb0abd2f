//! Merchants a family buys from.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::family::FamilyId;
use super::identifier::define_identifier;
use super::inventory::{ItemCategory, ItemLifecycle};

define_identifier! {
    /// Stable merchant identifier.
    MerchantId
}

/// Maximum length of a merchant name.
pub const MERCHANT_NAME_MAX: usize = 100;

/// Validation errors for merchant value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerchantValidationError {
    /// Name was blank.
    #[error("merchant name must not be empty")]
    EmptyName,
    /// Name exceeded the maximum length.
    #[error("merchant name must be at most {max} characters")]
    NameTooLong {
        /// Maximum permitted characters.
        max: usize,
    },
    /// Merchant type string was not recognised.
    #[error("unknown merchant type: {value}")]
    UnknownType {
        /// Rejected input.
        value: String,
    },
}

/// Merchant display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "Corner Grocer")]
pub struct MerchantName(String);

impl MerchantName {
    /// Validate and construct a [`MerchantName`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, MerchantValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MerchantValidationError::EmptyName);
        }
        if trimmed.chars().count() > MERCHANT_NAME_MAX {
            return Err(MerchantValidationError::NameTooLong {
                max: MERCHANT_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for MerchantName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<MerchantName> for String {
    fn from(value: MerchantName) -> Self {
        value.0
    }
}

impl TryFrom<String> for MerchantName {
    type Error = MerchantValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Kind of merchant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MerchantType {
    /// Large supermarket.
    Supermarket,
    /// Small grocery store.
    Grocery,
    /// Butcher.
    Butcher,
    /// Bakery.
    Bakery,
    /// Pharmacy.
    Pharmacy,
    /// Online delivery service.
    Online,
    /// Anything else.
    #[default]
    Other,
}

impl MerchantType {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supermarket => "supermarket",
            Self::Grocery => "grocery",
            Self::Butcher => "butcher",
            Self::Bakery => "bakery",
            Self::Pharmacy => "pharmacy",
            Self::Online => "online",
            Self::Other => "other",
        }
    }
}

impl FromStr for MerchantType {
    type Err = MerchantValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supermarket" => Ok(Self::Supermarket),
            "grocery" => Ok(Self::Grocery),
            "butcher" => Ok(Self::Butcher),
            "bakery" => Ok(Self::Bakery),
            "pharmacy" => Ok(Self::Pharmacy),
            "online" => Ok(Self::Online),
            "other" => Ok(Self::Other),
            other => Err(MerchantValidationError::UnknownType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Contact and location details shared by create and update requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MerchantContact {
    /// Contact phone number.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Street address.
    pub address: Option<String>,
}

/// Merchant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    /// Stable identifier.
    pub id: MerchantId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Display name.
    pub name: MerchantName,
    /// Kind of merchant.
    pub merchant_type: MerchantType,
    /// Contact details.
    #[serde(flatten)]
    pub contact: MerchantContact,
    /// Item categories this merchant sells.
    pub categories: Vec<ItemCategory>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Soft-delete state.
    pub lifecycle: ItemLifecycle,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a merchant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMerchant {
    /// Display name.
    pub name: MerchantName,
    /// Kind of merchant.
    pub merchant_type: MerchantType,
    /// Contact details.
    pub contact: MerchantContact,
    /// Categories sold.
    pub categories: Vec<ItemCategory>,
    /// Notes.
    pub notes: Option<String>,
}

/// Partial merchant update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerchantPatch {
    /// New name.
    pub name: Option<MerchantName>,
    /// New type.
    pub merchant_type: Option<MerchantType>,
    /// New phone.
    pub phone: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// Replacement category list.
    pub categories: Option<Vec<ItemCategory>>,
    /// New notes.
    pub notes: Option<String>,
}

impl MerchantPatch {
    /// Apply the patch to `merchant`.
    pub fn apply_to(self, merchant: &mut Merchant) {
        if let Some(name) = self.name {
            merchant.name = name;
        }
        if let Some(merchant_type) = self.merchant_type {
            merchant.merchant_type = merchant_type;
        }
        if let Some(phone) = self.phone {
            merchant.contact.phone = Some(phone);
        }
        if let Some(email) = self.email {
            merchant.contact.email = Some(email);
        }
        if let Some(address) = self.address {
            merchant.contact.address = Some(address);
        }
        if let Some(categories) = self.categories {
            merchant.categories = categories;
        }
        if let Some(notes) = self.notes {
            merchant.notes = Some(notes);
        }
    }
}
