//! Driving port for the order aggregator.

use async_trait::async_trait;
use pagination::Paginated;

use crate::domain::{
    Error, MerchantId, NewOrder, Order, OrderId, OrderListQuery, OrderStatus, UserId,
};

/// Request to build an order from the family's low-stock items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestockRequest {
    /// Merchant to order from.
    pub merchant_id: Option<MerchantId>,
    /// Order notes.
    pub notes: Option<String>,
}

/// Driving port for order creation and status tracking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderAggregator: Send + Sync {
    /// Create an order with at least one line.
    async fn create_order(&self, caller: &UserId, order: NewOrder) -> Result<Order, Error>;

    /// Create an order covering every low-stock item of the caller's family.
    async fn create_restock_order(
        &self,
        caller: &UserId,
        request: RestockRequest,
    ) -> Result<Order, Error>;

    /// Fetch an order with its lines.
    async fn get_order(&self, caller: &UserId, order_id: &OrderId) -> Result<Order, Error>;

    /// Page through orders, newest first.
    async fn list_orders(
        &self,
        caller: &UserId,
        query: OrderListQuery,
    ) -> Result<Paginated<Order>, Error>;

    /// Move an order to `status`.
    async fn update_order_status(
        &self,
        caller: &UserId,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, Error>;
}

/// Fixture aggregator for running without a database.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderAggregator;

#[async_trait]
impl OrderAggregator for FixtureOrderAggregator {
    async fn create_order(&self, _caller: &UserId, _order: NewOrder) -> Result<Order, Error> {
        Err(Error::not_part_of_family())
    }

    async fn create_restock_order(
        &self,
        _caller: &UserId,
        _request: RestockRequest,
    ) -> Result<Order, Error> {
        Err(Error::not_part_of_family())
    }

    async fn get_order(&self, _caller: &UserId, _order_id: &OrderId) -> Result<Order, Error> {
        Err(Error::not_found("order not found"))
    }

    async fn list_orders(
        &self,
        _caller: &UserId,
        query: OrderListQuery,
    ) -> Result<Paginated<Order>, Error> {
        Ok(Paginated::new(Vec::new(), 0, query.page))
    }

    async fn update_order_status(
        &self,
        _caller: &UserId,
        _order_id: &OrderId,
        _status: OrderStatus,
    ) -> Result<Order, Error> {
        Err(Error::not_found("order not found"))
    }
}
