//! Restock orders and their line items.
//!
//! Order lines snapshot the item name at creation time so an order stays
//! historically accurate after the source inventory item is renamed or
//! deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::family::FamilyId;
use super::identifier::define_identifier;
use super::inventory::{ItemId, ItemName, ItemUnit};
use super::merchant::MerchantId;
use super::user::UserId;

define_identifier! {
    /// Stable order identifier.
    OrderId
}

define_identifier! {
    /// Stable order line identifier.
    OrderItemId
}

/// Largest quantity accepted on an order line.
pub const ORDER_LINE_QUANTITY_MAX: u32 = 100_000;
/// Largest number of lines accepted on one order.
pub const ORDER_LINES_MAX: usize = 200;

/// Validation errors for order input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    /// The order has no lines.
    #[error("an order must contain at least one item")]
    NoItems,
    /// The order has more lines than allowed.
    #[error("an order may contain at most {max} items")]
    TooManyItems {
        /// Maximum permitted lines.
        max: usize,
    },
    /// A line quantity was zero or too large.
    #[error("item quantity must be between 1 and {max}")]
    InvalidQuantity {
        /// Maximum permitted quantity.
        max: u32,
    },
    /// Status string was not recognised.
    #[error("unknown order status: {value}")]
    UnknownStatus {
        /// Rejected input.
        value: String,
    },
}

/// Order status. Any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, not yet placed.
    #[default]
    Pending,
    /// Placed with the merchant.
    Processing,
    /// Delivered or collected.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl OrderStatus {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

/// Line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Stable identifier.
    pub id: OrderItemId,
    /// Item name copied when the order was created.
    pub name: ItemName,
    /// Quantity requested.
    pub quantity: u32,
    /// Unit label.
    pub unit: ItemUnit,
    /// Line notes.
    pub notes: Option<String>,
    /// Inventory item the line was created from, if any.
    pub inventory_item_id: Option<ItemId>,
}

/// Order record with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Stable identifier.
    pub id: OrderId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Merchant the order is placed with.
    pub merchant_id: Option<MerchantId>,
    /// Current status.
    pub status: OrderStatus,
    /// User who created the order.
    pub created_by: UserId,
    /// Order notes.
    pub notes: Option<String>,
    /// Lines; never empty.
    pub items: Vec<OrderItem>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Set when the order moves to [`OrderStatus::Completed`].
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Move the order to `status` at `now`.
    ///
    /// Entering [`OrderStatus::Completed`] from another status stamps
    /// `completed_at`. Leaving it keeps the stamp as history.
    pub fn transition(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        if status == OrderStatus::Completed && self.status != OrderStatus::Completed {
            self.completed_at = Some(now);
        }
        self.status = status;
        self.updated_at = now;
    }
}

/// Validated order line input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    /// Name snapshot.
    pub name: ItemName,
    /// Quantity requested.
    pub quantity: u32,
    /// Unit label.
    pub unit: ItemUnit,
    /// Line notes.
    pub notes: Option<String>,
    /// Source inventory item.
    pub inventory_item_id: Option<ItemId>,
}

impl NewOrderLine {
    /// Validate the quantity and assemble a line.
    pub fn new(
        name: ItemName,
        quantity: u32,
        unit: ItemUnit,
    ) -> Result<Self, OrderValidationError> {
        if !(1..=ORDER_LINE_QUANTITY_MAX).contains(&quantity) {
            return Err(OrderValidationError::InvalidQuantity {
                max: ORDER_LINE_QUANTITY_MAX,
            });
        }
        Ok(Self {
            name,
            quantity,
            unit,
            notes: None,
            inventory_item_id: None,
        })
    }

    /// Attach line notes.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Attach the inventory item the line was sourced from.
    #[must_use]
    pub fn with_inventory_item(mut self, item_id: Option<ItemId>) -> Self {
        self.inventory_item_id = item_id;
        self
    }
}

/// Non-empty list of order lines.
///
/// # Examples
/// ```
/// use pantry::domain::{OrderLines, OrderValidationError};
///
/// assert_eq!(OrderLines::new(Vec::new()), Err(OrderValidationError::NoItems));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLines(Vec<NewOrderLine>);

impl OrderLines {
    /// Validate the line count.
    pub fn new(lines: Vec<NewOrderLine>) -> Result<Self, OrderValidationError> {
        if lines.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        if lines.len() > ORDER_LINES_MAX {
            return Err(OrderValidationError::TooManyItems {
                max: ORDER_LINES_MAX,
            });
        }
        Ok(Self(lines))
    }

    /// Borrow the lines.
    pub fn as_slice(&self) -> &[NewOrderLine] {
        &self.0
    }

    /// Take ownership of the lines.
    pub fn into_inner(self) -> Vec<NewOrderLine> {
        self.0
    }
}

/// Validated input for creating an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Merchant to order from.
    pub merchant_id: Option<MerchantId>,
    /// Lines to order.
    pub lines: OrderLines,
    /// Order notes.
    pub notes: Option<String>,
}

/// Filter for order listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    /// Only return orders in this status.
    pub status: Option<OrderStatus>,
    /// Page to return.
    pub page: pagination::PageRequest,
}

/// Quantity to order so a low-stock item ends up above the threshold.
///
/// # Examples
/// ```
/// use pantry::domain::restock_quantity;
///
/// assert_eq!(restock_quantity(0, 1), 2);
/// assert_eq!(restock_quantity(1, 1), 1);
/// ```
pub fn restock_quantity(quantity: u32, threshold: u32) -> u32 {
    threshold.saturating_sub(quantity).saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rstest::rstest;

    fn order(status: OrderStatus) -> Order {
        let created = DateTime::<Utc>::UNIX_EPOCH;
        Order {
            id: OrderId::random(),
            family_id: FamilyId::random(),
            merchant_id: None,
            status,
            created_by: UserId::random(),
            notes: None,
            items: Vec::new(),
            created_at: created,
            updated_at: created,
            completed_at: None,
        }
    }

    #[rstest]
    fn completing_stamps_completed_at() {
        let mut order = order(OrderStatus::Processing);
        let now = order.created_at + TimeDelta::hours(2);
        order.transition(OrderStatus::Completed, now);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.completed_at, Some(now));
        assert_eq!(order.updated_at, now);
    }

    #[rstest]
    fn repeated_completion_keeps_first_stamp() {
        let mut order = order(OrderStatus::Pending);
        let first = order.created_at + TimeDelta::hours(1);
        order.transition(OrderStatus::Completed, first);
        order.transition(OrderStatus::Completed, first + TimeDelta::hours(1));
        assert_eq!(order.completed_at, Some(first));
    }

    #[rstest]
    #[case(OrderStatus::Completed, OrderStatus::Pending)]
    #[case(OrderStatus::Cancelled, OrderStatus::Processing)]
    #[case(OrderStatus::Completed, OrderStatus::Cancelled)]
    fn any_status_may_move_to_any_other(#[case] from: OrderStatus, #[case] to: OrderStatus) {
        let mut order = order(from);
        order.transition(to, order.created_at);
        assert_eq!(order.status, to);
    }

    #[rstest]
    #[case(0)]
    #[case(ORDER_LINE_QUANTITY_MAX + 1)]
    fn order_line_rejects_out_of_range_quantity(#[case] quantity: u32) {
        let name = ItemName::new("Eggs").expect("valid name");
        assert!(matches!(
            NewOrderLine::new(name, quantity, ItemUnit::default()),
            Err(OrderValidationError::InvalidQuantity { .. })
        ));
    }

    #[rstest]
    fn status_parsing_rejects_unknown_values() {
        assert_eq!("completed".parse::<OrderStatus>(), Ok(OrderStatus::Completed));
        assert!(matches!(
            "shipped".parse::<OrderStatus>(),
            Err(OrderValidationError::UnknownStatus { .. })
        ));
    }

    #[rstest]
    #[case(0, 1, 2)]
    #[case(1, 1, 1)]
    #[case(2, 5, 4)]
    #[case(7, 5, 1)]
    fn restock_quantity_lifts_above_threshold(
        #[case] quantity: u32,
        #[case] threshold: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(restock_quantity(quantity, threshold), expected);
    }
}
