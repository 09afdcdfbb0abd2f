//! Port for order persistence.

use async_trait::async_trait;
use pagination::Paginated;

use crate::domain::{FamilyId, Order, OrderId, OrderListQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "order repository query failed: {message}",
    }
}

/// Port for family-scoped order storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert the order and all of its lines in one transaction.
    async fn create(&self, order: &Order) -> Result<(), OrderRepositoryError>;

    /// Fetch an order with its lines.
    async fn find(
        &self,
        family_id: &FamilyId,
        order_id: &OrderId,
    ) -> Result<Option<Order>, OrderRepositoryError>;

    /// Persist `status`, `updated_at` and `completed_at`. Returns `false`
    /// when no order matched.
    async fn save_status(&self, order: &Order) -> Result<bool, OrderRepositoryError>;

    /// Page through orders, newest first.
    async fn list(
        &self,
        family_id: &FamilyId,
        query: &OrderListQuery,
    ) -> Result<Paginated<Order>, OrderRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderRepository;

#[async_trait]
impl OrderRepository for FixtureOrderRepository {
    async fn create(&self, _order: &Order) -> Result<(), OrderRepositoryError> {
        Ok(())
    }

    async fn find(
        &self,
        _family_id: &FamilyId,
        _order_id: &OrderId,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(None)
    }

    async fn save_status(&self, _order: &Order) -> Result<bool, OrderRepositoryError> {
        Ok(false)
    }

    async fn list(
        &self,
        _family_id: &FamilyId,
        query: &OrderListQuery,
    ) -> Result<Paginated<Order>, OrderRepositoryError> {
        Ok(Paginated::new(Vec::new(), 0, query.page))
    }
}
