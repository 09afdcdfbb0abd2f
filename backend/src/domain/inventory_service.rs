//! Inventory ledger service.
//!
//! Resolves the caller's family, delegates the atomic merge-on-add to the
//! repository and raises `new_item` and `low_stock` notifications after a
//! successful write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use mockable::Clock;
use pagination::Paginated;
use serde_json::json;
use tracing::info;

use crate::domain::notification_service::notify_quietly;
use crate::domain::ports::{
    FamilyDirectory, InventoryLedger, InventoryRepository, InventoryRepositoryError,
    ItemRevision, Notifier,
};
use crate::domain::{
    AddItemOutcome, ClassifiedItem, Error, FamilySettings, InventoryItem, ItemId, ItemLifecycle,
    ItemListQuery, ItemPatch, Membership, NewInventoryItem, NotificationType, UpdateItemOutcome,
    UserId, classify_expiry, is_low_stock,
};

/// Inventory service implementing [`InventoryLedger`].
#[derive(Clone)]
pub struct InventoryService<R, D, N> {
    items: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, D, N> InventoryService<R, D, N> {
    /// Create a new service with the given collaborators.
    pub fn new(items: Arc<R>, directory: Arc<D>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            items,
            directory,
            notifier,
            clock,
        }
    }
}

pub(crate) fn map_inventory_error(error: InventoryRepositoryError) -> Error {
    match error {
        InventoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("inventory repository unavailable: {message}"))
        }
        InventoryRepositoryError::Query { message } => {
            Error::internal(format!("inventory repository error: {message}"))
        }
        InventoryRepositoryError::DuplicateName { name } => {
            Error::conflict(format!("an item named {name} already exists"))
                .with_details(json!({ "field": "name", "code": "duplicate_name" }))
        }
    }
}

fn classify(item: InventoryItem, today: NaiveDate, settings: &FamilySettings) -> ClassifiedItem {
    ClassifiedItem {
        expiry_status: classify_expiry(item.expiry_date, today, settings.expiry_warning_days),
        is_low_stock: is_low_stock(item.quantity, settings.low_stock_threshold),
        item,
    }
}

/// Whether a quantity change moves an item into low stock.
fn crossed_into_low_stock(before: u32, after: u32, threshold: u32) -> bool {
    !is_low_stock(before, threshold) && is_low_stock(after, threshold)
}

impl<R, D, N> InventoryService<R, D, N>
where
    R: InventoryRepository,
    D: FamilyDirectory,
    N: Notifier,
{
    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    fn candidate(&self, membership: &Membership, item: NewInventoryItem) -> InventoryItem {
        let now = self.clock.utc();
        InventoryItem {
            id: ItemId::random(),
            family_id: membership.family_id,
            name: item.name,
            barcode: item.barcode,
            quantity: item.quantity,
            unit: item.unit,
            category: item.category,
            expiry_date: item.expiry_date,
            image_url: item.image_url,
            notes: item.notes,
            created_by: membership.user_id,
            lifecycle: ItemLifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    async fn announce_new_item(&self, membership: &Membership, item: &InventoryItem) {
        if !membership.settings.notify_new_items {
            return;
        }
        notify_quietly(
            self.notifier.as_ref(),
            &item.family_id,
            NotificationType::NewItem,
            "New item added",
            format!("{} was added to the inventory", item.name.as_ref()),
            json!({ "itemId": item.id, "addedBy": membership.user_id }),
        )
        .await;
    }

    async fn announce_low_stock(&self, membership: &Membership, item: &InventoryItem) {
        if !membership.settings.notify_low_stock {
            return;
        }
        notify_quietly(
            self.notifier.as_ref(),
            &item.family_id,
            NotificationType::LowStock,
            "Low stock",
            format!(
                "{} is running low ({} {} left)",
                item.name.as_ref(),
                item.quantity,
                item.unit.as_ref()
            ),
            json!({ "itemId": item.id, "quantity": item.quantity }),
        )
        .await;
    }
}

#[async_trait]
impl<R, D, N> InventoryLedger for InventoryService<R, D, N>
where
    R: InventoryRepository,
    D: FamilyDirectory,
    N: Notifier,
{
    async fn add_item(
        &self,
        caller: &UserId,
        item: NewInventoryItem,
    ) -> Result<AddItemOutcome, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let candidate = self.candidate(&membership, item);
        let outcome = self
            .items
            .add_or_merge(&candidate)
            .await
            .map_err(map_inventory_error)?;

        if outcome.is_duplicate {
            info!(
                family_id = %membership.family_id,
                item_id = %outcome.item.id,
                previous = ?outcome.previous_quantity,
                quantity = outcome.item.quantity,
                "merged into existing item"
            );
        } else {
            info!(family_id = %membership.family_id, item_id = %outcome.item.id, "item added");
            self.announce_new_item(&membership, &outcome.item).await;
        }
        Ok(outcome)
    }

    async fn update_item(
        &self,
        caller: &UserId,
        item_id: &ItemId,
        patch: ItemPatch,
    ) -> Result<UpdateItemOutcome, Error> {
        if patch.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        let membership = self.directory.resolve_membership(caller).await?;
        let ItemRevision { previous, current } = self
            .items
            .update(&membership.family_id, item_id, &patch, self.clock.utc())
            .await
            .map_err(map_inventory_error)?
            .ok_or_else(|| Error::not_found("item not found"))?;
        let updated = patch.changed_fields(&previous);

        if crossed_into_low_stock(
            previous.quantity,
            current.quantity,
            membership.settings.low_stock_threshold,
        ) {
            self.announce_low_stock(&membership, &current).await;
        }
        Ok(UpdateItemOutcome {
            item: current,
            updated,
        })
    }

    async fn delete_item(&self, caller: &UserId, item_id: &ItemId) -> Result<(), Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let deleted = self
            .items
            .soft_delete(&membership.family_id, item_id, self.clock.utc())
            .await
            .map_err(map_inventory_error)?;
        if !deleted {
            return Err(Error::not_found("item not found"));
        }
        info!(family_id = %membership.family_id, %item_id, "item deleted");
        Ok(())
    }

    async fn list_items(
        &self,
        caller: &UserId,
        query: ItemListQuery,
    ) -> Result<Paginated<ClassifiedItem>, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let page = self
            .items
            .list(&membership.family_id, &query)
            .await
            .map_err(map_inventory_error)?;
        let today = self.today();
        Ok(page.map(|item| classify(item, today, &membership.settings)))
    }

    async fn low_stock_items(&self, caller: &UserId) -> Result<Vec<ClassifiedItem>, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let items = self
            .items
            .list_low_stock(
                &membership.family_id,
                membership.settings.low_stock_threshold,
            )
            .await
            .map_err(map_inventory_error)?;
        let today = self.today();
        Ok(items
            .into_iter()
            .map(|item| classify(item, today, &membership.settings))
            .collect())
    }

    async fn expiring_items(&self, caller: &UserId) -> Result<Vec<ClassifiedItem>, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let today = self.today();
        let cutoff = today
            .checked_add_days(Days::new(u64::from(
                membership.settings.expiry_warning_days,
            )))
            .unwrap_or(NaiveDate::MAX);
        let items = self
            .items
            .list_expiring(&membership.family_id, cutoff)
            .await
            .map_err(map_inventory_error)?;
        Ok(items
            .into_iter()
            .map(|item| classify(item, today, &membership.settings))
            .collect())
    }
}

#[cfg(test)]
#[path = "inventory_service_tests.rs"]
mod tests;
