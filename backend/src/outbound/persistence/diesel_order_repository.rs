//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! Lines are stored in `order_items` with an explicit `position` so they are
//! read back in the order they were submitted.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::Paginated;
use uuid::Uuid;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{
    FamilyId, ItemId, ItemName, ItemUnit, MerchantId, Order, OrderId, OrderItem, OrderItemId,
    OrderListQuery, UserId,
};

use super::diesel_helpers::{
    collect_rows, count_from_db, map_basic_diesel_error, map_basic_pool_error, page_window,
    quantity_from_db, quantity_to_db,
};
use super::models::{OrderItemRow, OrderRow, OrderStatusChangeset};
use super::pool::{DbPool, PoolError};
use super::schema::{order_items, orders};

/// Diesel-backed implementation of the [`OrderRepository`] port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrderRepositoryError {
    map_basic_pool_error(error, OrderRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrderRepositoryError {
    map_basic_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn order_to_rows(order: &Order) -> Result<(OrderRow, Vec<OrderItemRow>), String> {
    let header = OrderRow {
        id: *order.id.as_uuid(),
        family_id: *order.family_id.as_uuid(),
        merchant_id: order.merchant_id.map(Uuid::from),
        status: order.status.as_str().to_owned(),
        created_by: *order.created_by.as_uuid(),
        notes: order.notes.clone(),
        created_at: order.created_at,
        updated_at: order.updated_at,
        completed_at: order.completed_at,
    };
    let lines = order
        .items
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let position =
                i32::try_from(index).map_err(|_| format!("order line {index} out of range"))?;
            Ok(OrderItemRow {
                id: *line.id.as_uuid(),
                order_id: header.id,
                position,
                name: line.name.as_ref().to_owned(),
                quantity: quantity_to_db(line.quantity)?,
                unit: line.unit.as_ref().to_owned(),
                notes: line.notes.clone(),
                inventory_item_id: line.inventory_item_id.map(Uuid::from),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok((header, lines))
}

fn row_to_line(row: OrderItemRow) -> Result<OrderItem, String> {
    let id = row.id;
    Ok(OrderItem {
        id: OrderItemId::new(row.id),
        name: ItemName::new(&row.name).map_err(|err| format!("order line {id}: {err}"))?,
        quantity: quantity_from_db(row.quantity)?,
        unit: ItemUnit::new(&row.unit).map_err(|err| format!("order line {id}: {err}"))?,
        notes: row.notes,
        inventory_item_id: row.inventory_item_id.map(ItemId::new),
    })
}

fn row_to_order(row: OrderRow, lines: Vec<OrderItemRow>) -> Result<Order, String> {
    let status = row
        .status
        .parse()
        .map_err(|err| format!("order {}: {err}", row.id))?;
    let items = lines
        .into_iter()
        .map(row_to_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Order {
        id: OrderId::new(row.id),
        family_id: FamilyId::new(row.family_id),
        merchant_id: row.merchant_id.map(MerchantId::new),
        status,
        created_by: UserId::new(row.created_by),
        notes: row.notes,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
        completed_at: row.completed_at,
    })
}

/// Load the lines of every order in `order_ids`, grouped by order and sorted
/// by position.
async fn load_lines(
    conn: &mut AsyncPgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderItemRow>>, diesel::result::Error> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<OrderItemRow> = order_items::table
        .filter(order_items::order_id.eq_any(order_ids))
        .order_by((order_items::order_id.asc(), order_items::position.asc()))
        .select(OrderItemRow::as_select())
        .load(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }
    Ok(grouped)
}

fn assemble(
    headers: Vec<OrderRow>,
    mut lines: HashMap<Uuid, Vec<OrderItemRow>>,
) -> Result<Vec<Order>, OrderRepositoryError> {
    collect_rows(
        headers.into_iter().map(|header| {
            let order_lines = lines.remove(&header.id).unwrap_or_default();
            row_to_order(header, order_lines)
        }),
        OrderRepositoryError::query,
    )
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        let (header, lines) = order_to_rows(order).map_err(OrderRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(orders::table)
                    .values(&header)
                    .execute(conn)
                    .await?;
                if !lines.is_empty() {
                    diesel::insert_into(order_items::table)
                        .values(&lines)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        family_id: &FamilyId,
        order_id: &OrderId,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let header: Option<OrderRow> = orders::table
            .filter(orders::id.eq(order_id.as_uuid()))
            .filter(orders::family_id.eq(family_id.as_uuid()))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(header) = header else {
            return Ok(None);
        };
        let lines = load_lines(&mut conn, &[header.id])
            .await
            .map_err(map_diesel_error)?;
        Ok(assemble(vec![header], lines)?.pop())
    }

    async fn save_status(&self, order: &Order) -> Result<bool, OrderRepositoryError> {
        let changes = OrderStatusChangeset {
            status: order.status.as_str(),
            updated_at: order.updated_at,
            completed_at: order.completed_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(orders::table)
            .filter(orders::id.eq(order.id.as_uuid()))
            .filter(orders::family_id.eq(order.family_id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn list(
        &self,
        family_id: &FamilyId,
        query: &OrderListQuery,
    ) -> Result<Paginated<Order>, OrderRepositoryError> {
        let scoped = || {
            let mut statement = orders::table
                .filter(orders::family_id.eq(*family_id.as_uuid()))
                .into_boxed();
            if let Some(status) = query.status {
                statement = statement.filter(orders::status.eq(status.as_str()));
            }
            statement
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = scoped()
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let (limit, offset) = page_window(query.page);
        let headers: Vec<OrderRow> = scoped()
            .order_by((orders::created_at.desc(), orders::id.asc()))
            .select(OrderRow::as_select())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = headers.iter().map(|header| header.id).collect();
        let lines = load_lines(&mut conn, &ids)
            .await
            .map_err(map_diesel_error)?;
        let orders = assemble(headers, lines)?;
        Ok(Paginated::new(orders, count_from_db(total), query.page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;
    use chrono::Utc;
    use rstest::rstest;

    fn order(lines: usize) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::random(),
            family_id: FamilyId::random(),
            merchant_id: None,
            status: OrderStatus::Pending,
            created_by: UserId::random(),
            notes: None,
            items: (0..lines)
                .map(|n| OrderItem {
                    id: OrderItemId::random(),
                    name: ItemName::new(format!("Item {n}")).expect("valid name"),
                    quantity: 2,
                    unit: ItemUnit::new("pcs").expect("valid unit"),
                    notes: None,
                    inventory_item_id: None,
                })
                .collect(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[rstest]
    fn lines_keep_submission_order() {
        let source = order(3);
        let (header, lines) = order_to_rows(&source).expect("rows");
        let positions: Vec<i32> = lines.iter().map(|line| line.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(lines.iter().all(|line| line.order_id == header.id));
        assert_eq!(header.status, "pending");
    }

    #[rstest]
    fn rows_rebuild_the_order() {
        let source = order(2);
        let (header, lines) = order_to_rows(&source).expect("rows");
        let rebuilt = row_to_order(header, lines).expect("order");
        assert_eq!(rebuilt, source);
    }

    #[rstest]
    fn unknown_status_is_reported() {
        let (mut header, _) = order_to_rows(&order(0)).expect("rows");
        header.status = "lost".to_owned();
        assert!(row_to_order(header, Vec::new()).is_err());
    }
}
