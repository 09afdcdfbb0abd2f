//! Port for inventory item persistence.
//!
//! The merge-on-add rule lives behind [`InventoryRepository::add_or_merge`]
//! because only the storage layer can make "look up by name, then insert or
//! increment" atomic against concurrent requests for the same family and
//! name.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pagination::Paginated;

use crate::domain::{
    AddItemOutcome, FamilyId, InventoryItem, ItemId, ItemListQuery, ItemPatch,
};

use super::define_port_error;

/// An item as it was before an update and as it is after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRevision {
    /// Row replaced by the update.
    pub previous: InventoryItem,
    /// Row written by the update.
    pub current: InventoryItem,
}

define_port_error! {
    /// Errors raised by inventory repository adapters.
    pub enum InventoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "inventory repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "inventory repository query failed: {message}",
        /// Another active item in the family already uses the name.
        DuplicateName { name: String } =>
            "an active item named {name} already exists",
    }
}

/// Port for family-scoped inventory storage. Every lookup ignores deleted
/// items and items of other families.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Insert `candidate`, or merge its quantity into the active item of the
    /// same family whose name matches case-insensitively.
    ///
    /// On merge only `quantity` and `updated_at` of the existing item change,
    /// and the outcome reports the quantity before the increment.
    async fn add_or_merge(
        &self,
        candidate: &InventoryItem,
    ) -> Result<AddItemOutcome, InventoryRepositoryError>;

    /// Fetch an active item of the family.
    async fn find_active(
        &self,
        family_id: &FamilyId,
        item_id: &ItemId,
    ) -> Result<Option<InventoryItem>, InventoryRepositoryError>;

    /// Apply the provided fields of `patch` and bump `updated_at`.
    ///
    /// The old row is read and replaced atomically, so concurrent updates
    /// of the same item see each other's results. Returns `None` when no
    /// active item matches.
    async fn update(
        &self,
        family_id: &FamilyId,
        item_id: &ItemId,
        patch: &ItemPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ItemRevision>, InventoryRepositoryError>;

    /// Mark an active item deleted. Returns `false` when none matched.
    async fn soft_delete(
        &self,
        family_id: &FamilyId,
        item_id: &ItemId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, InventoryRepositoryError>;

    /// Page through active items.
    async fn list(
        &self,
        family_id: &FamilyId,
        query: &ItemListQuery,
    ) -> Result<Paginated<InventoryItem>, InventoryRepositoryError>;

    /// Active items with quantity at or below `threshold`, lowest first.
    async fn list_low_stock(
        &self,
        family_id: &FamilyId,
        threshold: u32,
    ) -> Result<Vec<InventoryItem>, InventoryRepositoryError>;

    /// Active items expiring on or before `cutoff`, soonest first.
    async fn list_expiring(
        &self,
        family_id: &FamilyId,
        cutoff: NaiveDate,
    ) -> Result<Vec<InventoryItem>, InventoryRepositoryError>;
}

/// Fixture implementation that always inserts and stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureInventoryRepository;

#[async_trait]
impl InventoryRepository for FixtureInventoryRepository {
    async fn add_or_merge(
        &self,
        candidate: &InventoryItem,
    ) -> Result<AddItemOutcome, InventoryRepositoryError> {
        Ok(AddItemOutcome {
            item: candidate.clone(),
            is_duplicate: false,
            previous_quantity: None,
        })
    }

    async fn find_active(
        &self,
        _family_id: &FamilyId,
        _item_id: &ItemId,
    ) -> Result<Option<InventoryItem>, InventoryRepositoryError> {
        Ok(None)
    }

    async fn update(
        &self,
        _family_id: &FamilyId,
        _item_id: &ItemId,
        _patch: &ItemPatch,
        _updated_at: DateTime<Utc>,
    ) -> Result<Option<ItemRevision>, InventoryRepositoryError> {
        Ok(None)
    }

    async fn soft_delete(
        &self,
        _family_id: &FamilyId,
        _item_id: &ItemId,
        _deleted_at: DateTime<Utc>,
    ) -> Result<bool, InventoryRepositoryError> {
        Ok(false)
    }

    async fn list(
        &self,
        _family_id: &FamilyId,
        query: &ItemListQuery,
    ) -> Result<Paginated<InventoryItem>, InventoryRepositoryError> {
        Ok(Paginated::new(Vec::new(), 0, query.page))
    }

    async fn list_low_stock(
        &self,
        _family_id: &FamilyId,
        _threshold: u32,
    ) -> Result<Vec<InventoryItem>, InventoryRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_expiring(
        &self,
        _family_id: &FamilyId,
        _cutoff: NaiveDate,
    ) -> Result<Vec<InventoryItem>, InventoryRepositoryError> {
        Ok(Vec::new())
    }
}
