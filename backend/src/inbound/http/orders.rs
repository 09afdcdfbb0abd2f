//! Order aggregator API handlers.
//!
//! Orders snapshot line names and quantities at creation time. Later edits to
//! inventory never rewrite an existing order.

use actix_web::{HttpResponse, get, patch, post, web};
use pagination::{PageRequest, Paginated};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::RestockRequest;
use crate::domain::{
    Error, ItemId, ItemName, ItemUnit, MerchantId, NewOrder, NewOrderLine, Order, OrderId,
    OrderLines, OrderListQuery, OrderStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::OrderPageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field, invalid_list_entry, optional_notes, parse_id,
};

/// Query parameters for `GET /api/v1/orders`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// `pending`, `processing`, `completed` or `cancelled`.
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One requested line.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    #[schema(example = "Milk")]
    pub name: String,
    #[schema(example = 2)]
    pub quantity: u32,
    pub unit: Option<String>,
    pub notes: Option<String>,
    /// Inventory item the line restocks, when known.
    pub inventory_item_id: Option<String>,
}

/// Body for `POST /api/v1/orders`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub merchant_id: Option<String>,
    pub items: Vec<OrderLineRequest>,
    pub notes: Option<String>,
}

/// Body for `POST /api/v1/orders/restock`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockOrderRequest {
    pub merchant_id: Option<String>,
    pub notes: Option<String>,
}

/// Body for `PATCH /api/v1/orders/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "completed")]
    pub status: String,
}

fn parse_merchant(raw: Option<&str>) -> Result<Option<MerchantId>, Error> {
    raw.map(|value| parse_id(value, FieldName::new("merchantId")))
        .transpose()
}

fn parse_status(raw: &str) -> Result<OrderStatus, Error> {
    raw.parse()
        .map_err(|err| invalid_field(FieldName::new("status"), err))
}

fn parse_line(index: usize, line: OrderLineRequest) -> Result<NewOrderLine, Error> {
    let field = FieldName::new("items");
    let name = ItemName::new(&line.name).map_err(|err| invalid_list_entry(field, index, err))?;
    let unit = match line.unit.as_deref() {
        None => ItemUnit::default(),
        Some(raw) => ItemUnit::new(raw).map_err(|err| invalid_list_entry(field, index, err))?,
    };
    let inventory_item_id = line
        .inventory_item_id
        .as_deref()
        .map(|raw| parse_id::<ItemId>(raw, FieldName::new("inventoryItemId")))
        .transpose()?;
    let built = NewOrderLine::new(name, line.quantity, unit)
        .map_err(|err| invalid_list_entry(field, index, err))?;
    Ok(built
        .with_notes(optional_notes(line.notes)?)
        .with_inventory_item(inventory_item_id))
}

impl TryFrom<CreateOrderRequest> for NewOrder {
    type Error = Error;

    fn try_from(body: CreateOrderRequest) -> Result<Self, Self::Error> {
        let merchant_id = parse_merchant(body.merchant_id.as_deref())?;
        let lines = body
            .items
            .into_iter()
            .enumerate()
            .map(|(index, line)| parse_line(index, line))
            .collect::<Result<Vec<_>, _>>()?;
        let lines =
            OrderLines::new(lines).map_err(|err| invalid_field(FieldName::new("items"), err))?;
        Ok(Self {
            merchant_id,
            lines,
            notes: optional_notes(body.notes)?,
        })
    }
}

/// List the family's orders, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Page of orders", body = OrderPageSchema),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["orders"],
    operation_id = "listOrders"
)]
#[get("/orders")]
pub async fn list_orders(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    params: web::Query<ListOrdersParams>,
) -> ApiResult<web::Json<Paginated<Order>>> {
    let params = params.into_inner();
    let status = params.status.as_deref().map(parse_status).transpose()?;
    let query = OrderListQuery {
        status,
        page: PageRequest::new(params.page, params.limit),
    };
    let page = state.orders.list_orders(user.user_id(), query).await?;
    Ok(web::Json(page))
}

/// Fetch an order with its lines.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order identifier")),
    responses(
        (status = 200, description = "Order", body = Order),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Order not found", body = Error)
    ),
    tags = ["orders"],
    operation_id = "getOrder"
)]
#[get("/orders/{id}")]
pub async fn get_order(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Order>> {
    let order_id: OrderId = parse_id(&path, FieldName::new("id"))?;
    let order = state.orders.get_order(user.user_id(), &order_id).await?;
    Ok(web::Json(order))
}

/// Create an order.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Merchant or referenced item not found", body = Error)
    ),
    tags = ["orders"],
    operation_id = "createOrder"
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreateOrderRequest>,
) -> ApiResult<HttpResponse> {
    let order = NewOrder::try_from(payload.into_inner())?;
    let created = state.orders.create_order(user.user_id(), order).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Create an order covering every low-stock item.
#[utoipa::path(
    post,
    path = "/api/v1/orders/restock",
    request_body = RestockOrderRequest,
    responses(
        (status = 201, description = "Restock order created", body = Order),
        (status = 400, description = "No items are low on stock", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Merchant not found", body = Error)
    ),
    tags = ["orders"],
    operation_id = "createRestockOrder"
)]
#[post("/orders/restock")]
pub async fn create_restock_order(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<RestockOrderRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let request = RestockRequest {
        merchant_id: parse_merchant(body.merchant_id.as_deref())?,
        notes: optional_notes(body.notes)?,
    };
    let created = state
        .orders
        .create_restock_order(user.user_id(), request)
        .await?;
    Ok(HttpResponse::Created().json(created))
}

/// Move an order to a new status.
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    params(("id" = String, Path, description = "Order identifier")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = Order),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Order not found", body = Error)
    ),
    tags = ["orders"],
    operation_id = "updateOrderStatus"
)]
#[patch("/orders/{id}/status")]
pub async fn update_order_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdateStatusRequest>,
) -> ApiResult<web::Json<Order>> {
    let order_id: OrderId = parse_id(&path, FieldName::new("id"))?;
    let status = parse_status(&payload.status)?;
    let order = state
        .orders
        .update_order_status(user.user_id(), &order_id, status)
        .await?;
    Ok(web::Json(order))
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;
