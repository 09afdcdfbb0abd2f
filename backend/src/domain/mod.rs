//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities shared by the HTTP and
//! persistence adapters, and the services that implement the driving ports.
//! Every service derives the caller's family through the
//! [`ports::FamilyDirectory`] before reading or writing tenant data.
//!
//! Public surface:
//! - [`Error`] and [`ErrorCode`]: transport-agnostic failure payload.
//! - Tenancy: [`Family`], [`FamilyMember`], [`Membership`], [`FamilyRole`].
//! - Inventory: [`InventoryItem`], [`classify_expiry`], [`is_low_stock`].
//! - Merchants, orders and notifications with their input types.
//! - Services: [`FamilyService`], [`InventoryService`], [`MerchantService`],
//!   [`OrderService`], [`NotificationService`], [`NotificationFanout`].

pub mod auth;
pub mod error;
pub mod family;
mod family_service;
mod identifier;
pub mod inventory;
mod inventory_service;
pub mod merchant;
mod merchant_service;
pub mod notification;
mod notification_service;
pub mod order;
mod order_service;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::auth::{AccessToken, AccessTokenValidationError};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::family::{
    Capability, Family, FamilyId, FamilyMember, FamilyName, FamilyRole, FamilySettings,
    FamilySettingsPatch, FamilyValidationError, InviteCode, Membership,
};
pub use self::family_service::FamilyService;
pub use self::inventory::{
    AddItemOutcome, ClassifiedItem, ExpiryStatus, InventoryItem, InventoryValidationError,
    ItemCategory, ItemField, ItemId, ItemLifecycle, ItemListQuery, ItemName, ItemPatch,
    ItemSortBy, ItemUnit, NewInventoryItem, SortOrder, UpdateItemOutcome, classify_expiry,
    is_low_stock,
};
pub use self::inventory_service::InventoryService;
pub use self::merchant::{
    Merchant, MerchantContact, MerchantId, MerchantName, MerchantPatch, MerchantType,
    MerchantValidationError, NewMerchant,
};
pub use self::merchant_service::MerchantService;
pub use self::notification::{
    NewNotification, Notification, NotificationId, NotificationText, NotificationType,
    NotificationValidationError, NotificationView,
};
pub use self::notification_service::{NotificationFanout, NotificationService};
pub use self::order::{
    NewOrder, NewOrderLine, Order, OrderId, OrderItem, OrderItemId, OrderLines, OrderListQuery,
    OrderStatus, OrderValidationError, restock_quantity,
};
pub use self::order_service::OrderService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{PersonName, PhoneNumber, User, UserId, UserValidationError};

#[cfg(test)]
pub(crate) mod test_support;
