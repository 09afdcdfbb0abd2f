//! PostgreSQL-backed `MerchantRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{PageRequest, Paginated};

use crate::domain::ports::{MerchantRepository, MerchantRepositoryError};
use crate::domain::{
    FamilyId, ItemCategory, ItemLifecycle, Merchant, MerchantContact, MerchantId, MerchantName,
};

use super::diesel_helpers::{
    collect_rows, count_from_db, map_basic_diesel_error, map_basic_pool_error, page_window,
};
use super::models::{MerchantChangeset, MerchantRow, NewMerchantRow};
use super::pool::{DbPool, PoolError};
use super::schema::merchants;

/// Diesel-backed implementation of the [`MerchantRepository`] port.
#[derive(Clone)]
pub struct DieselMerchantRepository {
    pool: DbPool,
}

impl DieselMerchantRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MerchantRepositoryError {
    map_basic_pool_error(error, MerchantRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MerchantRepositoryError {
    map_basic_diesel_error(
        error,
        MerchantRepositoryError::query,
        MerchantRepositoryError::connection,
    )
}

fn category_names(categories: &[ItemCategory]) -> Vec<&'static str> {
    categories.iter().map(|c| c.as_str()).collect()
}

fn row_to_merchant(row: MerchantRow) -> Result<Merchant, String> {
    let id = row.id;
    let categories = row
        .categories
        .iter()
        .map(|raw| raw.parse::<ItemCategory>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("merchant {id}: {err}"))?;
    Ok(Merchant {
        id: MerchantId::new(row.id),
        family_id: FamilyId::new(row.family_id),
        name: MerchantName::new(&row.name).map_err(|err| format!("merchant {id}: {err}"))?,
        merchant_type: row
            .merchant_type
            .parse()
            .map_err(|err| format!("merchant {id}: {err}"))?,
        contact: MerchantContact {
            phone: row.phone,
            email: row.email,
            address: row.address,
        },
        categories,
        notes: row.notes,
        lifecycle: ItemLifecycle::from_active_flag(row.is_active),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl MerchantRepository for DieselMerchantRepository {
    async fn create(&self, merchant: &Merchant) -> Result<(), MerchantRepositoryError> {
        let row = NewMerchantRow {
            id: *merchant.id.as_uuid(),
            family_id: *merchant.family_id.as_uuid(),
            name: merchant.name.as_ref(),
            merchant_type: merchant.merchant_type.as_str(),
            phone: merchant.contact.phone.as_deref(),
            email: merchant.contact.email.as_deref(),
            address: merchant.contact.address.as_deref(),
            categories: category_names(&merchant.categories),
            notes: merchant.notes.as_deref(),
            is_active: merchant.lifecycle.is_active(),
            created_at: merchant.created_at,
            updated_at: merchant.updated_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(merchants::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_active(
        &self,
        family_id: &FamilyId,
        merchant_id: &MerchantId,
    ) -> Result<Option<Merchant>, MerchantRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<MerchantRow> = merchants::table
            .filter(merchants::id.eq(merchant_id.as_uuid()))
            .filter(merchants::family_id.eq(family_id.as_uuid()))
            .filter(merchants::is_active.eq(true))
            .select(MerchantRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_merchant)
            .transpose()
            .map_err(MerchantRepositoryError::query)
    }

    async fn save(&self, merchant: &Merchant) -> Result<bool, MerchantRepositoryError> {
        let changes = MerchantChangeset {
            name: merchant.name.as_ref(),
            merchant_type: merchant.merchant_type.as_str(),
            phone: merchant.contact.phone.as_deref(),
            email: merchant.contact.email.as_deref(),
            address: merchant.contact.address.as_deref(),
            categories: category_names(&merchant.categories),
            notes: merchant.notes.as_deref(),
            updated_at: merchant.updated_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(merchants::table)
            .filter(merchants::id.eq(merchant.id.as_uuid()))
            .filter(merchants::family_id.eq(merchant.family_id.as_uuid()))
            .filter(merchants::is_active.eq(true))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn soft_delete(
        &self,
        family_id: &FamilyId,
        merchant_id: &MerchantId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, MerchantRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(merchants::table)
            .filter(merchants::id.eq(merchant_id.as_uuid()))
            .filter(merchants::family_id.eq(family_id.as_uuid()))
            .filter(merchants::is_active.eq(true))
            .set((
                merchants::is_active.eq(false),
                merchants::updated_at.eq(deleted_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn list(
        &self,
        family_id: &FamilyId,
        page: PageRequest,
    ) -> Result<Paginated<Merchant>, MerchantRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let scope = merchants::family_id
            .eq(*family_id.as_uuid())
            .and(merchants::is_active.eq(true));

        let total: i64 = merchants::table
            .filter(scope)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let (limit, offset) = page_window(page);
        let rows: Vec<MerchantRow> = merchants::table
            .filter(scope)
            .order_by((merchants::name.asc(), merchants::id.asc()))
            .select(MerchantRow::as_select())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let merchants = collect_rows(
            rows.into_iter().map(row_to_merchant),
            MerchantRepositoryError::query,
        )?;
        Ok(Paginated::new(merchants, count_from_db(total), page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(categories: &[&str]) -> MerchantRow {
        let now = Utc::now();
        MerchantRow {
            id: uuid::Uuid::nil(),
            family_id: uuid::Uuid::nil(),
            name: "Corner Grocer".to_owned(),
            merchant_type: "grocery".to_owned(),
            phone: Some("5550100".to_owned()),
            email: None,
            address: None,
            categories: categories.iter().map(|c| (*c).to_owned()).collect(),
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn stored_categories_are_parsed() {
        let merchant = row_to_merchant(row(&["dairy", "bakery"])).expect("valid row");
        assert_eq!(
            merchant.categories,
            vec![ItemCategory::Dairy, ItemCategory::Bakery]
        );
        assert_eq!(merchant.contact.phone.as_deref(), Some("5550100"));
    }

    #[rstest]
    fn unknown_category_is_reported() {
        let err = row_to_merchant(row(&["toys"])).expect_err("unknown category");
        assert!(err.contains("toys"), "unexpected message: {err}");
    }
}
