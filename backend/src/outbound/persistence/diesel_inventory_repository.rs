//! PostgreSQL-backed `InventoryRepository` implementation using Diesel ORM.
//!
//! Merge-on-add locks the matching active row with `SELECT ... FOR UPDATE`
//! inside a transaction. Two first-time adds of the same name can still race
//! past the lookup; the loser hits `inventory_items_active_name` and is
//! retried once, at which point it finds the winner's row and merges.
//! Updates lock the row the same way and return it alongside the new one.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::Paginated;
use tracing::debug;

use crate::domain::ports::{InventoryRepository, InventoryRepositoryError, ItemRevision};
use crate::domain::{
    AddItemOutcome, FamilyId, InventoryItem, ItemId, ItemLifecycle, ItemListQuery, ItemName,
    ItemPatch, ItemSortBy, ItemUnit, SortOrder, UserId,
};

use super::diesel_helpers::{
    collect_rows, count_from_db, map_basic_diesel_error, map_basic_pool_error, page_window,
    quantity_from_db, quantity_to_db, unique_violation,
};
use super::models::{InventoryItemChangeset, InventoryItemRow, NewInventoryItemRow};
use super::pool::{DbPool, PoolError};
use super::schema::inventory_items;

const ACTIVE_NAME_CONSTRAINT: &str = "inventory_items_active_name";

/// Diesel-backed implementation of the [`InventoryRepository`] port.
#[derive(Clone)]
pub struct DieselInventoryRepository {
    pool: DbPool,
}

impl DieselInventoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> InventoryRepositoryError {
    map_basic_pool_error(error, InventoryRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> InventoryRepositoryError {
    map_basic_diesel_error(
        error,
        InventoryRepositoryError::query,
        InventoryRepositoryError::connection,
    )
}

fn row_to_item(row: InventoryItemRow) -> Result<InventoryItem, String> {
    let context = |err: &dyn std::fmt::Display| format!("inventory item {}: {err}", row.id);
    Ok(InventoryItem {
        id: ItemId::new(row.id),
        family_id: FamilyId::new(row.family_id),
        name: ItemName::new(&row.name).map_err(|err| context(&err))?,
        barcode: row.barcode.clone(),
        quantity: quantity_from_db(row.quantity)?,
        unit: ItemUnit::new(&row.unit).map_err(|err| context(&err))?,
        category: row.category.parse().map_err(|err| context(&err))?,
        expiry_date: row.expiry_date,
        image_url: row.image_url.clone(),
        notes: row.notes.clone(),
        created_by: UserId::new(row.created_by),
        lifecycle: ItemLifecycle::from_active_flag(row.is_active),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Escape `LIKE` wildcards so the search term matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn filtered<'a>(
    family_id: &FamilyId,
    query: &'a ItemListQuery,
) -> inventory_items::BoxedQuery<'a, Pg> {
    let mut statement = inventory_items::table
        .filter(inventory_items::family_id.eq(*family_id.as_uuid()))
        .filter(inventory_items::is_active.eq(true))
        .into_boxed();
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        statement = statement.filter(inventory_items::name.ilike(like_pattern(search)));
    }
    if let Some(category) = query.category {
        statement = statement.filter(inventory_items::category.eq(category.as_str()));
    }
    statement
}

fn ordered<'a>(
    statement: inventory_items::BoxedQuery<'a, Pg>,
    sort_by: ItemSortBy,
    order: SortOrder,
) -> inventory_items::BoxedQuery<'a, Pg> {
    use inventory_items::{created_at, expiry_date, id, name_normalized, quantity};

    let statement = match (sort_by, order) {
        (ItemSortBy::Name, SortOrder::Asc) => statement.order_by(name_normalized.asc()),
        (ItemSortBy::Name, SortOrder::Desc) => statement.order_by(name_normalized.desc()),
        (ItemSortBy::Quantity, SortOrder::Asc) => statement.order_by(quantity.asc()),
        (ItemSortBy::Quantity, SortOrder::Desc) => statement.order_by(quantity.desc()),
        (ItemSortBy::ExpiryDate, SortOrder::Asc) => {
            statement.order_by(expiry_date.asc().nulls_last())
        }
        (ItemSortBy::ExpiryDate, SortOrder::Desc) => {
            statement.order_by(expiry_date.desc().nulls_last())
        }
        (ItemSortBy::DateAdded, SortOrder::Asc) => statement.order_by(created_at.asc()),
        (ItemSortBy::DateAdded, SortOrder::Desc) => statement.order_by(created_at.desc()),
    };
    statement.then_order_by(id.asc())
}

enum AddResult {
    Inserted(InventoryItemRow),
    Merged {
        row: InventoryItemRow,
        previous: i32,
    },
}

async fn add_or_merge_once(
    conn: &mut AsyncPgConnection,
    candidate: &NewInventoryItemRow<'_>,
    touched_at: DateTime<Utc>,
) -> Result<AddResult, diesel::result::Error> {
    conn.transaction(|conn| {
        async move {
            let existing: Option<InventoryItemRow> = inventory_items::table
                .filter(inventory_items::family_id.eq(candidate.family_id))
                .filter(inventory_items::name_normalized.eq(&candidate.name_normalized))
                .filter(inventory_items::is_active.eq(true))
                .select(InventoryItemRow::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?;

            let Some(existing) = existing else {
                let row = diesel::insert_into(inventory_items::table)
                    .values(candidate)
                    .returning(InventoryItemRow::as_returning())
                    .get_result(conn)
                    .await?;
                return Ok(AddResult::Inserted(row));
            };

            let previous = existing.quantity;
            let row = diesel::update(inventory_items::table.find(existing.id))
                .set((
                    inventory_items::quantity.eq(previous.saturating_add(candidate.quantity)),
                    inventory_items::updated_at.eq(touched_at),
                ))
                .returning(InventoryItemRow::as_returning())
                .get_result(conn)
                .await?;
            Ok(AddResult::Merged { row, previous })
        }
        .scope_boxed()
    })
    .await
}

async fn update_locked(
    conn: &mut AsyncPgConnection,
    family_id: &FamilyId,
    item_id: &ItemId,
    changes: &InventoryItemChangeset<'_>,
) -> Result<Option<(InventoryItemRow, InventoryItemRow)>, diesel::result::Error> {
    conn.transaction(|conn| {
        async move {
            let previous: Option<InventoryItemRow> = inventory_items::table
                .filter(inventory_items::id.eq(item_id.as_uuid()))
                .filter(inventory_items::family_id.eq(family_id.as_uuid()))
                .filter(inventory_items::is_active.eq(true))
                .select(InventoryItemRow::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?;
            let Some(previous) = previous else {
                return Ok(None);
            };

            let current = diesel::update(inventory_items::table.find(previous.id))
                .set(changes)
                .returning(InventoryItemRow::as_returning())
                .get_result(conn)
                .await?;
            Ok(Some((previous, current)))
        }
        .scope_boxed()
    })
    .await
}

#[async_trait]
impl InventoryRepository for DieselInventoryRepository {
    async fn add_or_merge(
        &self,
        candidate: &InventoryItem,
    ) -> Result<AddItemOutcome, InventoryRepositoryError> {
        let new_row = NewInventoryItemRow {
            id: *candidate.id.as_uuid(),
            family_id: *candidate.family_id.as_uuid(),
            name: candidate.name.as_ref(),
            name_normalized: candidate.name.normalized(),
            barcode: candidate.barcode.as_deref(),
            quantity: quantity_to_db(candidate.quantity).map_err(InventoryRepositoryError::query)?,
            unit: candidate.unit.as_ref(),
            category: candidate.category.as_str(),
            expiry_date: candidate.expiry_date,
            image_url: candidate.image_url.as_deref(),
            notes: candidate.notes.as_deref(),
            created_by: *candidate.created_by.as_uuid(),
            is_active: true,
            created_at: candidate.created_at,
            updated_at: candidate.updated_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut outcome = add_or_merge_once(&mut conn, &new_row, candidate.updated_at).await;
        let raced = matches!(
            &outcome,
            Err(err) if unique_violation(err) == Some(ACTIVE_NAME_CONSTRAINT)
        );
        if raced {
            debug!(name = new_row.name, "concurrent add detected; retrying as merge");
            outcome = add_or_merge_once(&mut conn, &new_row, candidate.updated_at).await;
        }

        let to_item = |row| row_to_item(row).map_err(InventoryRepositoryError::query);
        match outcome.map_err(map_diesel_error)? {
            AddResult::Inserted(row) => Ok(AddItemOutcome {
                item: to_item(row)?,
                is_duplicate: false,
                previous_quantity: None,
            }),
            AddResult::Merged { row, previous } => Ok(AddItemOutcome {
                item: to_item(row)?,
                is_duplicate: true,
                previous_quantity: Some(
                    quantity_from_db(previous).map_err(InventoryRepositoryError::query)?,
                ),
            }),
        }
    }

    async fn find_active(
        &self,
        family_id: &FamilyId,
        item_id: &ItemId,
    ) -> Result<Option<InventoryItem>, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<InventoryItemRow> = inventory_items::table
            .filter(inventory_items::id.eq(item_id.as_uuid()))
            .filter(inventory_items::family_id.eq(family_id.as_uuid()))
            .filter(inventory_items::is_active.eq(true))
            .select(InventoryItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_item)
            .transpose()
            .map_err(InventoryRepositoryError::query)
    }

    async fn update(
        &self,
        family_id: &FamilyId,
        item_id: &ItemId,
        patch: &ItemPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ItemRevision>, InventoryRepositoryError> {
        let quantity = patch
            .quantity
            .map(quantity_to_db)
            .transpose()
            .map_err(InventoryRepositoryError::query)?;
        let changes = InventoryItemChangeset {
            quantity,
            expiry_date: patch.expiry_date,
            name: patch.name.as_ref().map(AsRef::as_ref),
            name_normalized: patch.name.as_ref().map(ItemName::normalized),
            category: patch.category.map(|c| c.as_str()),
            notes: patch.notes.as_deref(),
            updated_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = update_locked(&mut conn, family_id, item_id, &changes)
            .await
            .map_err(|err| match unique_violation(&err) {
                Some(ACTIVE_NAME_CONSTRAINT) => InventoryRepositoryError::duplicate_name(
                    changes.name.unwrap_or_default(),
                ),
                _ => map_diesel_error(err),
            })?;
        let Some((previous, current)) = rows else {
            return Ok(None);
        };
        let to_item = |row| row_to_item(row).map_err(InventoryRepositoryError::query);
        Ok(Some(ItemRevision {
            previous: to_item(previous)?,
            current: to_item(current)?,
        }))
    }

    async fn soft_delete(
        &self,
        family_id: &FamilyId,
        item_id: &ItemId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(inventory_items::table)
            .filter(inventory_items::id.eq(item_id.as_uuid()))
            .filter(inventory_items::family_id.eq(family_id.as_uuid()))
            .filter(inventory_items::is_active.eq(true))
            .set((
                inventory_items::is_active.eq(false),
                inventory_items::updated_at.eq(deleted_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn list(
        &self,
        family_id: &FamilyId,
        query: &ItemListQuery,
    ) -> Result<Paginated<InventoryItem>, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(family_id, query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let (limit, offset) = page_window(query.page);
        let rows: Vec<InventoryItemRow> =
            ordered(filtered(family_id, query), query.sort_by, query.sort_order)
                .select(InventoryItemRow::as_select())
                .limit(limit)
                .offset(offset)
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;

        let items = collect_rows(
            rows.into_iter().map(row_to_item),
            InventoryRepositoryError::query,
        )?;
        Ok(Paginated::new(items, count_from_db(total), query.page))
    }

    async fn list_low_stock(
        &self,
        family_id: &FamilyId,
        threshold: u32,
    ) -> Result<Vec<InventoryItem>, InventoryRepositoryError> {
        let threshold = quantity_to_db(threshold).map_err(InventoryRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<InventoryItemRow> = inventory_items::table
            .filter(inventory_items::family_id.eq(family_id.as_uuid()))
            .filter(inventory_items::is_active.eq(true))
            .filter(inventory_items::quantity.le(threshold))
            .order_by((
                inventory_items::quantity.asc(),
                inventory_items::name_normalized.asc(),
            ))
            .select(InventoryItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_item), InventoryRepositoryError::query)
    }

    async fn list_expiring(
        &self,
        family_id: &FamilyId,
        cutoff: NaiveDate,
    ) -> Result<Vec<InventoryItem>, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<InventoryItemRow> = inventory_items::table
            .filter(inventory_items::family_id.eq(family_id.as_uuid()))
            .filter(inventory_items::is_active.eq(true))
            .filter(inventory_items::expiry_date.le(cutoff))
            .order_by((
                inventory_items::expiry_date.asc(),
                inventory_items::name_normalized.asc(),
            ))
            .select(InventoryItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(row_to_item), InventoryRepositoryError::query)
    }
}
