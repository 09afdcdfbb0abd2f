//! Internal Diesel row structs.
//!
//! These types are implementation details of the persistence layer and never
//! cross into the domain. Conversions live next to the adapter that uses
//! them.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{
    access_tokens, families, family_members, inventory_items, merchants, notification_reads,
    notifications, order_items, orders, users,
};

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub phone: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = access_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccessTokenRow {
    pub user_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = families)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FamilyRow {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub owner_id: Uuid,
    pub settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = families)]
pub(crate) struct NewFamilyRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub invite_code: &'a str,
    pub owner_id: Uuid,
    pub settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = family_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FamilyMemberRow {
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = family_members)]
pub(crate) struct NewFamilyMemberRow<'a> {
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub role: &'a str,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = inventory_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InventoryItemRow {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub category: String,
    pub expiry_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = inventory_items)]
pub(crate) struct NewInventoryItemRow<'a> {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: &'a str,
    pub name_normalized: String,
    pub barcode: Option<&'a str>,
    pub quantity: i32,
    pub unit: &'a str,
    pub category: &'a str,
    pub expiry_date: Option<NaiveDate>,
    pub image_url: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = inventory_items)]
pub(crate) struct InventoryItemChangeset<'a> {
    pub quantity: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub name: Option<&'a str>,
    pub name_normalized: Option<String>,
    pub category: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Merchants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = merchants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MerchantRow {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub merchant_type: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub categories: Vec<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = merchants)]
pub(crate) struct NewMerchantRow<'a> {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: &'a str,
    pub merchant_type: &'a str,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub categories: Vec<&'a str>,
    pub notes: Option<&'a str>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full overwrite of the mutable merchant columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = merchants, treat_none_as_null = true)]
pub(crate) struct MerchantChangeset<'a> {
    pub name: &'a str,
    pub merchant_type: &'a str,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub categories: Vec<&'a str>,
    pub notes: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub family_id: Uuid,
    pub merchant_id: Option<Uuid>,
    pub status: String,
    pub created_by: Uuid,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    pub notes: Option<String>,
    pub inventory_item_id: Option<Uuid>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = orders, treat_none_as_null = true)]
pub(crate) struct OrderStatusChangeset<'a> {
    pub status: &'a str,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub family_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub recipient_ids: Vec<Uuid>,
    pub sent_by: Option<Uuid>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notification_reads)]
pub(crate) struct NewNotificationReadRow {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub read_at: DateTime<Utc>,
}
