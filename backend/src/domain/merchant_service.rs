//! Merchant registry service: family-scoped CRUD with soft delete.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::info;

use crate::domain::ports::{
    FamilyDirectory, MerchantRegistry, MerchantRepository, MerchantRepositoryError,
};
use crate::domain::{
    Error, ItemLifecycle, Merchant, MerchantId, MerchantPatch, NewMerchant, UserId,
};

/// Merchant service implementing [`MerchantRegistry`].
#[derive(Clone)]
pub struct MerchantService<R, D> {
    merchants: Arc<R>,
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<R, D> MerchantService<R, D> {
    /// Create a new service with the given collaborators.
    pub fn new(merchants: Arc<R>, directory: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            merchants,
            directory,
            clock,
        }
    }
}

pub(crate) fn map_merchant_error(error: MerchantRepositoryError) -> Error {
    match error {
        MerchantRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("merchant repository unavailable: {message}"))
        }
        MerchantRepositoryError::Query { message } => {
            Error::internal(format!("merchant repository error: {message}"))
        }
    }
}

fn merchant_not_found() -> Error {
    Error::not_found("merchant not found")
}

#[async_trait]
impl<R, D> MerchantRegistry for MerchantService<R, D>
where
    R: MerchantRepository,
    D: FamilyDirectory,
{
    async fn create_merchant(
        &self,
        caller: &UserId,
        merchant: NewMerchant,
    ) -> Result<Merchant, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let now = self.clock.utc();
        let merchant = Merchant {
            id: MerchantId::random(),
            family_id: membership.family_id,
            name: merchant.name,
            merchant_type: merchant.merchant_type,
            contact: merchant.contact,
            categories: merchant.categories,
            notes: merchant.notes,
            lifecycle: ItemLifecycle::Active,
            created_at: now,
            updated_at: now,
        };
        self.merchants
            .create(&merchant)
            .await
            .map_err(map_merchant_error)?;
        info!(family_id = %merchant.family_id, merchant_id = %merchant.id, "merchant created");
        Ok(merchant)
    }

    async fn get_merchant(
        &self,
        caller: &UserId,
        merchant_id: &MerchantId,
    ) -> Result<Merchant, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        self.merchants
            .find_active(&membership.family_id, merchant_id)
            .await
            .map_err(map_merchant_error)?
            .ok_or_else(merchant_not_found)
    }

    async fn update_merchant(
        &self,
        caller: &UserId,
        merchant_id: &MerchantId,
        patch: MerchantPatch,
    ) -> Result<Merchant, Error> {
        let mut merchant = self.get_merchant(caller, merchant_id).await?;
        patch.apply_to(&mut merchant);
        merchant.updated_at = self.clock.utc();
        let saved = self
            .merchants
            .save(&merchant)
            .await
            .map_err(map_merchant_error)?;
        if !saved {
            return Err(merchant_not_found());
        }
        Ok(merchant)
    }

    async fn delete_merchant(&self, caller: &UserId, merchant_id: &MerchantId) -> Result<(), Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let deleted = self
            .merchants
            .soft_delete(&membership.family_id, merchant_id, self.clock.utc())
            .await
            .map_err(map_merchant_error)?;
        if !deleted {
            return Err(merchant_not_found());
        }
        info!(family_id = %membership.family_id, %merchant_id, "merchant deleted");
        Ok(())
    }

    async fn list_merchants(
        &self,
        caller: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<Merchant>, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        self.merchants
            .list(&membership.family_id, page)
            .await
            .map_err(map_merchant_error)
    }
}
