//! Family inventory items and the pure rules that classify them.
//!
//! Items are unique per family by case-insensitive name among active items;
//! adding a name that already exists merges quantities instead of creating a
//! second row. Deleting an item moves it to [`ItemLifecycle::Deleted`] and
//! keeps the row for order history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::family::FamilyId;
use super::identifier::define_identifier;
use super::user::UserId;

define_identifier! {
    /// Stable inventory item identifier.
    ItemId
}

/// Maximum length of an item name.
pub const ITEM_NAME_MAX: usize = 100;
/// Maximum length of a unit label.
pub const ITEM_UNIT_MAX: usize = 20;
/// Largest quantity accepted for a single item.
pub const ITEM_QUANTITY_MAX: u32 = 100_000;
/// Maximum length of free-text notes.
pub const NOTES_MAX: usize = 500;
/// Maximum length of a search term.
pub const SEARCH_MAX: usize = 100;

/// Validation errors for inventory value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryValidationError {
    /// Name was blank.
    #[error("name must not be empty")]
    EmptyName,
    /// Name exceeded the maximum length.
    #[error("name must be at most {max} characters")]
    NameTooLong {
        /// Maximum permitted characters.
        max: usize,
    },
    /// Unit was blank.
    #[error("unit must not be empty")]
    EmptyUnit,
    /// Unit exceeded the maximum length.
    #[error("unit must be at most {max} characters")]
    UnitTooLong {
        /// Maximum permitted characters.
        max: usize,
    },
    /// Category string was not recognised.
    #[error("unknown category: {value}")]
    UnknownCategory {
        /// Rejected input.
        value: String,
    },
}

/// Item or order-line name, trimmed and bounded.
///
/// # Examples
/// ```
/// use pantry::domain::ItemName;
///
/// let name = ItemName::new("  Whole Milk ").expect("valid name");
/// assert_eq!(name.as_ref(), "Whole Milk");
/// assert_eq!(name.normalized(), "whole milk");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "Milk")]
pub struct ItemName(String);

impl ItemName {
    /// Validate and construct an [`ItemName`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InventoryValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InventoryValidationError::EmptyName);
        }
        if trimmed.chars().count() > ITEM_NAME_MAX {
            return Err(InventoryValidationError::NameTooLong { max: ITEM_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Case-folded key used for duplicate detection.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ItemName> for String {
    fn from(value: ItemName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ItemName {
    type Error = InventoryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Free-form unit label such as `pcs`, `kg` or `litres`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "pcs")]
pub struct ItemUnit(String);

impl ItemUnit {
    /// Validate and construct an [`ItemUnit`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InventoryValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InventoryValidationError::EmptyUnit);
        }
        if trimmed.chars().count() > ITEM_UNIT_MAX {
            return Err(InventoryValidationError::UnitTooLong { max: ITEM_UNIT_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl Default for ItemUnit {
    fn default() -> Self {
        Self("pcs".to_owned())
    }
}

impl AsRef<str> for ItemUnit {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ItemUnit> for String {
    fn from(value: ItemUnit) -> Self {
        value.0
    }
}

impl TryFrom<String> for ItemUnit {
    type Error = InventoryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Closed set of item categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Milk, cheese, yoghurt.
    Dairy,
    /// Fruit and vegetables.
    Produce,
    /// Meat and fish.
    Meat,
    /// Bread and baked goods.
    Bakery,
    /// Frozen food.
    Frozen,
    /// Dry goods and tins.
    Pantry,
    /// Drinks.
    Beverages,
    /// Snacks and sweets.
    Snacks,
    /// Cleaning and household supplies.
    Household,
    /// Anything else.
    #[default]
    Other,
}

impl ItemCategory {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dairy => "dairy",
            Self::Produce => "produce",
            Self::Meat => "meat",
            Self::Bakery => "bakery",
            Self::Frozen => "frozen",
            Self::Pantry => "pantry",
            Self::Beverages => "beverages",
            Self::Snacks => "snacks",
            Self::Household => "household",
            Self::Other => "other",
        }
    }
}

impl FromStr for ItemCategory {
    type Err = InventoryValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dairy" => Ok(Self::Dairy),
            "produce" => Ok(Self::Produce),
            "meat" => Ok(Self::Meat),
            "bakery" => Ok(Self::Bakery),
            "frozen" => Ok(Self::Frozen),
            "pantry" => Ok(Self::Pantry),
            "beverages" => Ok(Self::Beverages),
            "snacks" => Ok(Self::Snacks),
            "household" => Ok(Self::Household),
            "other" => Ok(Self::Other),
            other => Err(InventoryValidationError::UnknownCategory {
                value: other.to_owned(),
            }),
        }
    }
}

/// Lifecycle of a soft-deletable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemLifecycle {
    /// Visible and mutable.
    #[default]
    Active,
    /// Soft-deleted; hidden from every query and treated as missing.
    Deleted,
}

impl ItemLifecycle {
    /// Whether records in this state are visible.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Map the stored `is_active` flag to a lifecycle state.
    pub fn from_active_flag(is_active: bool) -> Self {
        if is_active { Self::Active } else { Self::Deleted }
    }
}

/// Inventory item owned by a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Stable identifier.
    pub id: ItemId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Display name; unique per family among active items, ignoring case.
    pub name: ItemName,
    /// Optional barcode captured by a scanner.
    pub barcode: Option<String>,
    /// Quantity on hand.
    pub quantity: u32,
    /// Unit label.
    pub unit: ItemUnit,
    /// Category.
    pub category: ItemCategory,
    /// Best-before date.
    pub expiry_date: Option<NaiveDate>,
    /// Optional image location.
    pub image_url: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// User who first added the item.
    pub created_by: UserId,
    /// Soft-delete state.
    pub lifecycle: ItemLifecycle,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for adding an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryItem {
    /// Name to add or merge into.
    pub name: ItemName,
    /// Quantity to add.
    pub quantity: u32,
    /// Unit label for new items.
    pub unit: ItemUnit,
    /// Category for new items.
    pub category: ItemCategory,
    /// Barcode for new items.
    pub barcode: Option<String>,
    /// Expiry date for new items.
    pub expiry_date: Option<NaiveDate>,
    /// Image location for new items.
    pub image_url: Option<String>,
    /// Notes for new items.
    pub notes: Option<String>,
}

/// Result of an add request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemOutcome {
    /// The created or merged item.
    pub item: InventoryItem,
    /// True when the request merged into an existing item.
    pub is_duplicate: bool,
    /// Quantity before the merge; present only for merges.
    pub previous_quantity: Option<u32>,
}

/// Field of an item that an update can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ItemField {
    /// Quantity on hand.
    Quantity,
    /// Best-before date.
    ExpiryDate,
    /// Display name.
    Name,
    /// Category.
    Category,
    /// Notes.
    Notes,
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    /// New quantity.
    pub quantity: Option<u32>,
    /// New expiry date.
    pub expiry_date: Option<NaiveDate>,
    /// New name.
    pub name: Option<ItemName>,
    /// New category.
    pub category: Option<ItemCategory>,
    /// New notes.
    pub notes: Option<String>,
}

impl ItemPatch {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.expiry_date.is_none()
            && self.name.is_none()
            && self.category.is_none()
            && self.notes.is_none()
    }

    /// Fields whose provided value differs from `item`.
    ///
    /// # Examples
    /// ```
    /// use pantry::domain::{ItemField, ItemPatch};
    /// # use pantry::domain::{FamilyId, InventoryItem, ItemCategory, ItemId, ItemLifecycle,
    /// #     ItemName, ItemUnit, UserId};
    /// # let now = chrono::Utc::now();
    /// # let item = InventoryItem {
    /// #     id: ItemId::random(), family_id: FamilyId::random(),
    /// #     name: ItemName::new("Milk").unwrap(), barcode: None, quantity: 2,
    /// #     unit: ItemUnit::default(), category: ItemCategory::Dairy, expiry_date: None,
    /// #     image_url: None, notes: None, created_by: UserId::random(),
    /// #     lifecycle: ItemLifecycle::Active, created_at: now, updated_at: now,
    /// # };
    /// let patch = ItemPatch { quantity: Some(2), category: Some(ItemCategory::Frozen), ..ItemPatch::default() };
    /// assert_eq!(patch.changed_fields(&item), vec![ItemField::Category]);
    /// ```
    pub fn changed_fields(&self, item: &InventoryItem) -> Vec<ItemField> {
        let mut changed = Vec::new();
        if self.quantity.is_some_and(|q| q != item.quantity) {
            changed.push(ItemField::Quantity);
        }
        if self.expiry_date.is_some_and(|d| item.expiry_date != Some(d)) {
            changed.push(ItemField::ExpiryDate);
        }
        if self
            .name
            .as_ref()
            .is_some_and(|n| n.as_ref() != item.name.as_ref())
        {
            changed.push(ItemField::Name);
        }
        if self.category.is_some_and(|c| c != item.category) {
            changed.push(ItemField::Category);
        }
        if self
            .notes
            .as_ref()
            .is_some_and(|n| item.notes.as_ref() != Some(n))
        {
            changed.push(ItemField::Notes);
        }
        changed
    }
}

/// Result of an update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemOutcome {
    /// Item after the update.
    pub item: InventoryItem,
    /// Fields whose value actually changed.
    pub updated: Vec<ItemField>,
}

/// Expiry classification of an item on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    /// No expiry date, or the date is beyond the warning window.
    Fresh,
    /// Expires today or within the warning window.
    Expiring,
    /// Expiry date is in the past.
    Expired,
}

/// Classify an expiry date relative to `today`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use pantry::domain::{ExpiryStatus, classify_expiry};
///
/// let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
/// let tomorrow = NaiveDate::from_ymd_opt(2024, 5, 11);
/// assert_eq!(classify_expiry(tomorrow, today, 2), ExpiryStatus::Expiring);
/// assert_eq!(classify_expiry(None, today, 2), ExpiryStatus::Fresh);
/// ```
pub fn classify_expiry(
    expiry_date: Option<NaiveDate>,
    today: NaiveDate,
    warning_days: u32,
) -> ExpiryStatus {
    let Some(expiry_date) = expiry_date else {
        return ExpiryStatus::Fresh;
    };
    let days_until = (expiry_date - today).num_days();
    if days_until < 0 {
        ExpiryStatus::Expired
    } else if days_until <= i64::from(warning_days) {
        ExpiryStatus::Expiring
    } else {
        ExpiryStatus::Fresh
    }
}

/// Whether `quantity` is at or below the family's low-stock threshold.
pub fn is_low_stock(quantity: u32, threshold: u32) -> bool {
    quantity <= threshold
}

/// Column used to order item listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ItemSortBy {
    /// Alphabetical by name, ignoring case.
    Name,
    /// Quantity on hand.
    Quantity,
    /// Expiry date; items without one sort last in both directions.
    ExpiryDate,
    /// Creation time.
    #[default]
    DateAdded,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

/// Listing parameters for active items of one family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    /// Case-insensitive substring filter on the name.
    pub search: Option<String>,
    /// Category filter.
    pub category: Option<ItemCategory>,
    /// Page to return.
    pub page: PageRequest,
    /// Sort column.
    pub sort_by: ItemSortBy,
    /// Sort direction.
    pub sort_order: SortOrder,
}

/// An item annotated with its stock and expiry classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedItem {
    /// The item.
    #[serde(flatten)]
    pub item: InventoryItem,
    /// Expiry classification for today.
    pub expiry_status: ExpiryStatus,
    /// Whether the quantity is at or below the family threshold.
    pub is_low_stock: bool,
}
