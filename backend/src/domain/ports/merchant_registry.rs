//! Driving port for the merchant registry.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{Error, Merchant, MerchantId, MerchantPatch, NewMerchant, UserId};

/// Driving port for family-scoped merchant CRUD.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MerchantRegistry: Send + Sync {
    /// Create a merchant in the caller's family.
    async fn create_merchant(&self, caller: &UserId, merchant: NewMerchant)
    -> Result<Merchant, Error>;

    /// Fetch an active merchant.
    async fn get_merchant(&self, caller: &UserId, merchant_id: &MerchantId)
    -> Result<Merchant, Error>;

    /// Apply a partial update.
    async fn update_merchant(
        &self,
        caller: &UserId,
        merchant_id: &MerchantId,
        patch: MerchantPatch,
    ) -> Result<Merchant, Error>;

    /// Soft-delete a merchant.
    async fn delete_merchant(&self, caller: &UserId, merchant_id: &MerchantId)
    -> Result<(), Error>;

    /// Page through active merchants.
    async fn list_merchants(
        &self,
        caller: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<Merchant>, Error>;
}

/// Fixture registry for running without a database.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMerchantRegistry;

#[async_trait]
impl MerchantRegistry for FixtureMerchantRegistry {
    async fn create_merchant(
        &self,
        _caller: &UserId,
        _merchant: NewMerchant,
    ) -> Result<Merchant, Error> {
        Err(Error::not_part_of_family())
    }

    async fn get_merchant(
        &self,
        _caller: &UserId,
        _merchant_id: &MerchantId,
    ) -> Result<Merchant, Error> {
        Err(Error::not_found("merchant not found"))
    }

    async fn update_merchant(
        &self,
        _caller: &UserId,
        _merchant_id: &MerchantId,
        _patch: MerchantPatch,
    ) -> Result<Merchant, Error> {
        Err(Error::not_found("merchant not found"))
    }

    async fn delete_merchant(
        &self,
        _caller: &UserId,
        _merchant_id: &MerchantId,
    ) -> Result<(), Error> {
        Err(Error::not_found("merchant not found"))
    }

    async fn list_merchants(
        &self,
        _caller: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<Merchant>, Error> {
        Ok(Paginated::new(Vec::new(), 0, page))
    }
}
