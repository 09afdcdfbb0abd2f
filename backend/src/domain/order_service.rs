//! Order aggregator service.
//!
//! Orders snapshot line names at creation. A restock order is built from the
//! family's current low-stock items, each line topping its item back up to
//! just above the threshold.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Paginated;
use serde_json::json;
use tracing::info;

use crate::domain::inventory_service::map_inventory_error;
use crate::domain::merchant_service::map_merchant_error;
use crate::domain::notification_service::notify_quietly;
use crate::domain::ports::{
    FamilyDirectory, InventoryRepository, MerchantRepository, Notifier, OrderAggregator,
    OrderRepository, OrderRepositoryError, RestockRequest,
};
use crate::domain::{
    Error, Membership, MerchantId, NewOrder, NewOrderLine, NotificationType, Order, OrderId,
    OrderItem, OrderItemId, OrderListQuery, OrderStatus, UserId, restock_quantity,
};

/// Order service implementing [`OrderAggregator`].
#[derive(Clone)]
pub struct OrderService<R, M, I, D, N> {
    orders: Arc<R>,
    merchants: Arc<M>,
    items: Arc<I>,
    directory: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, M, I, D, N> OrderService<R, M, I, D, N> {
    /// Create a new service with the given collaborators.
    pub fn new(
        orders: Arc<R>,
        merchants: Arc<M>,
        items: Arc<I>,
        directory: Arc<D>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            merchants,
            items,
            directory,
            notifier,
            clock,
        }
    }
}

fn map_order_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("order repository unavailable: {message}"))
        }
        OrderRepositoryError::Query { message } => {
            Error::internal(format!("order repository error: {message}"))
        }
    }
}

fn order_not_found() -> Error {
    Error::not_found("order not found")
}

fn snapshot(line: NewOrderLine) -> OrderItem {
    OrderItem {
        id: OrderItemId::random(),
        name: line.name,
        quantity: line.quantity,
        unit: line.unit,
        notes: line.notes,
        inventory_item_id: line.inventory_item_id,
    }
}

impl<R, M, I, D, N> OrderService<R, M, I, D, N>
where
    R: OrderRepository,
    M: MerchantRepository,
    I: InventoryRepository,
    D: FamilyDirectory,
    N: Notifier,
{
    async fn require_merchant(
        &self,
        membership: &Membership,
        merchant_id: Option<&MerchantId>,
    ) -> Result<(), Error> {
        let Some(merchant_id) = merchant_id else {
            return Ok(());
        };
        self.merchants
            .find_active(&membership.family_id, merchant_id)
            .await
            .map_err(map_merchant_error)?
            .ok_or_else(|| Error::not_found("merchant not found"))
            .map(|_| ())
    }

    async fn require_items(
        &self,
        membership: &Membership,
        lines: &[NewOrderLine],
    ) -> Result<(), Error> {
        for item_id in lines.iter().filter_map(|line| line.inventory_item_id.as_ref()) {
            self.items
                .find_active(&membership.family_id, item_id)
                .await
                .map_err(map_inventory_error)?
                .ok_or_else(|| Error::not_found("item not found"))?;
        }
        Ok(())
    }

    async fn place(
        &self,
        membership: &Membership,
        merchant_id: Option<MerchantId>,
        lines: Vec<NewOrderLine>,
        notes: Option<String>,
    ) -> Result<Order, Error> {
        self.require_merchant(membership, merchant_id.as_ref()).await?;
        let now = self.clock.utc();
        let order = Order {
            id: OrderId::random(),
            family_id: membership.family_id,
            merchant_id,
            status: OrderStatus::Pending,
            created_by: membership.user_id,
            notes,
            items: lines.into_iter().map(snapshot).collect(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.orders.create(&order).await.map_err(map_order_error)?;
        info!(
            family_id = %order.family_id,
            order_id = %order.id,
            lines = order.items.len(),
            "order created"
        );

        if membership.settings.notify_orders {
            notify_quietly(
                self.notifier.as_ref(),
                &order.family_id,
                NotificationType::OrderCreated,
                "New order",
                format!("An order with {} item(s) was created", order.items.len()),
                json!({ "orderId": order.id, "createdBy": order.created_by }),
            )
            .await;
        }
        Ok(order)
    }
}

#[async_trait]
impl<R, M, I, D, N> OrderAggregator for OrderService<R, M, I, D, N>
where
    R: OrderRepository,
    M: MerchantRepository,
    I: InventoryRepository,
    D: FamilyDirectory,
    N: Notifier,
{
    async fn create_order(&self, caller: &UserId, order: NewOrder) -> Result<Order, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let lines = order.lines.into_inner();
        self.require_items(&membership, &lines).await?;
        self.place(&membership, order.merchant_id, lines, order.notes)
            .await
    }

    async fn create_restock_order(
        &self,
        caller: &UserId,
        request: RestockRequest,
    ) -> Result<Order, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let threshold = membership.settings.low_stock_threshold;
        let low = self
            .items
            .list_low_stock(&membership.family_id, threshold)
            .await
            .map_err(map_inventory_error)?;
        if low.is_empty() {
            return Err(Error::invalid_request("no low-stock items to restock"));
        }

        let mut lines = Vec::with_capacity(low.len());
        for item in low {
            let quantity = restock_quantity(item.quantity, threshold);
            let line = NewOrderLine::new(item.name, quantity, item.unit)
                .map_err(|err| Error::invalid_request(err.to_string()))?
                .with_inventory_item(Some(item.id));
            lines.push(line);
        }
        self.place(&membership, request.merchant_id, lines, request.notes)
            .await
    }

    async fn get_order(&self, caller: &UserId, order_id: &OrderId) -> Result<Order, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        self.orders
            .find(&membership.family_id, order_id)
            .await
            .map_err(map_order_error)?
            .ok_or_else(order_not_found)
    }

    async fn list_orders(
        &self,
        caller: &UserId,
        query: OrderListQuery,
    ) -> Result<Paginated<Order>, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        self.orders
            .list(&membership.family_id, &query)
            .await
            .map_err(map_order_error)
    }

    async fn update_order_status(
        &self,
        caller: &UserId,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let mut order = self
            .orders
            .find(&membership.family_id, order_id)
            .await
            .map_err(map_order_error)?
            .ok_or_else(order_not_found)?;
        let previous = order.status;
        order.transition(status, self.clock.utc());
        let saved = self
            .orders
            .save_status(&order)
            .await
            .map_err(map_order_error)?;
        if !saved {
            return Err(order_not_found());
        }
        info!(%order_id, from = %previous, to = %status, "order status changed");

        let completed = status == OrderStatus::Completed && previous != OrderStatus::Completed;
        if completed && membership.settings.notify_orders {
            notify_quietly(
                self.notifier.as_ref(),
                &order.family_id,
                NotificationType::OrderCompleted,
                "Order completed",
                format!("An order with {} item(s) was completed", order.items.len()),
                json!({ "orderId": order.id }),
            )
            .await;
        }
        Ok(order)
    }
}

#[cfg(test)]
#[path = "order_service_tests.rs"]
mod tests;
