//! Driving port for the inventory ledger.

use async_trait::async_trait;
use pagination::Paginated;

use crate::domain::{
    AddItemOutcome, ClassifiedItem, Error, ItemId, ItemListQuery, ItemPatch, NewInventoryItem,
    UpdateItemOutcome, UserId,
};

/// Driving port for inventory operations. The family is always the caller's
/// current family.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Add an item, merging into an existing active item with the same name.
    async fn add_item(&self, caller: &UserId, item: NewInventoryItem)
    -> Result<AddItemOutcome, Error>;

    /// Apply a partial update and report which fields changed.
    async fn update_item(
        &self,
        caller: &UserId,
        item_id: &ItemId,
        patch: ItemPatch,
    ) -> Result<UpdateItemOutcome, Error>;

    /// Soft-delete an item.
    async fn delete_item(&self, caller: &UserId, item_id: &ItemId) -> Result<(), Error>;

    /// List active items with their classification.
    async fn list_items(
        &self,
        caller: &UserId,
        query: ItemListQuery,
    ) -> Result<Paginated<ClassifiedItem>, Error>;

    /// Active items at or below the family's low-stock threshold.
    async fn low_stock_items(&self, caller: &UserId) -> Result<Vec<ClassifiedItem>, Error>;

    /// Active items that are expiring or expired.
    async fn expiring_items(&self, caller: &UserId) -> Result<Vec<ClassifiedItem>, Error>;
}

/// Fixture ledger for running without a database.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureInventoryLedger;

#[async_trait]
impl InventoryLedger for FixtureInventoryLedger {
    async fn add_item(
        &self,
        _caller: &UserId,
        _item: NewInventoryItem,
    ) -> Result<AddItemOutcome, Error> {
        Err(Error::not_part_of_family())
    }

    async fn update_item(
        &self,
        _caller: &UserId,
        _item_id: &ItemId,
        _patch: ItemPatch,
    ) -> Result<UpdateItemOutcome, Error> {
        Err(Error::not_part_of_family())
    }

    async fn delete_item(&self, _caller: &UserId, _item_id: &ItemId) -> Result<(), Error> {
        Err(Error::not_part_of_family())
    }

    async fn list_items(
        &self,
        _caller: &UserId,
        query: ItemListQuery,
    ) -> Result<Paginated<ClassifiedItem>, Error> {
        Ok(Paginated::new(Vec::new(), 0, query.page))
    }

    async fn low_stock_items(&self, _caller: &UserId) -> Result<Vec<ClassifiedItem>, Error> {
        Ok(Vec::new())
    }

    async fn expiring_items(&self, _caller: &UserId) -> Result<Vec<ClassifiedItem>, Error> {
        Ok(Vec::new())
    }
}
