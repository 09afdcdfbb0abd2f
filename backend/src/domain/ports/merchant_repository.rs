//! Port for merchant persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{PageRequest, Paginated};

use crate::domain::{FamilyId, Merchant, MerchantId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by merchant repository adapters.
    pub enum MerchantRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "merchant repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "merchant repository query failed: {message}",
    }
}

/// Port for family-scoped merchant storage. Lookups ignore deleted merchants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MerchantRepository: Send + Sync {
    /// Insert a merchant.
    async fn create(&self, merchant: &Merchant) -> Result<(), MerchantRepositoryError>;

    /// Fetch an active merchant of the family.
    async fn find_active(
        &self,
        family_id: &FamilyId,
        merchant_id: &MerchantId,
    ) -> Result<Option<Merchant>, MerchantRepositoryError>;

    /// Overwrite the mutable fields of an active merchant. Returns `false`
    /// when none matched.
    async fn save(&self, merchant: &Merchant) -> Result<bool, MerchantRepositoryError>;

    /// Mark an active merchant deleted. Returns `false` when none matched.
    async fn soft_delete(
        &self,
        family_id: &FamilyId,
        merchant_id: &MerchantId,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, MerchantRepositoryError>;

    /// Page through active merchants ordered by name.
    async fn list(
        &self,
        family_id: &FamilyId,
        page: PageRequest,
    ) -> Result<Paginated<Merchant>, MerchantRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMerchantRepository;

#[async_trait]
impl MerchantRepository for FixtureMerchantRepository {
    async fn create(&self, _merchant: &Merchant) -> Result<(), MerchantRepositoryError> {
        Ok(())
    }

    async fn find_active(
        &self,
        _family_id: &FamilyId,
        _merchant_id: &MerchantId,
    ) -> Result<Option<Merchant>, MerchantRepositoryError> {
        Ok(None)
    }

    async fn save(&self, _merchant: &Merchant) -> Result<bool, MerchantRepositoryError> {
        Ok(false)
    }

    async fn soft_delete(
        &self,
        _family_id: &FamilyId,
        _merchant_id: &MerchantId,
        _deleted_at: DateTime<Utc>,
    ) -> Result<bool, MerchantRepositoryError> {
        Ok(false)
    }

    async fn list(
        &self,
        _family_id: &FamilyId,
        page: PageRequest,
    ) -> Result<Paginated<Merchant>, MerchantRepositoryError> {
        Ok(Paginated::new(Vec::new(), 0, page))
    }
}
