//! Inventory ledger API handlers.
//!
//! ```text
//! GET    /api/v1/inventory?search=milk&sortBy=expiryDate&sortOrder=asc
//! GET    /api/v1/inventory/low-stock
//! GET    /api/v1/inventory/expiring
//! POST   /api/v1/inventory          {"name":"Milk","quantity":2,"unit":"l"}
//! PATCH  /api/v1/inventory/{id}     {"quantity":1}
//! DELETE /api/v1/inventory/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::NaiveDate;
use pagination::{PageRequest, Paginated};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::inventory::SEARCH_MAX;
use crate::domain::{
    AddItemOutcome, ClassifiedItem, Error, ItemCategory, ItemId, ItemListQuery, ItemName,
    ItemPatch, ItemSortBy, ItemUnit, NewInventoryItem, SortOrder, UpdateItemOutcome,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::ItemPageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, ensure_item_quantity, invalid_field, optional_notes, optional_text, parse_id,
};

const BARCODE_MAX: usize = 64;
const IMAGE_URL_MAX: usize = 2_048;

/// Query parameters for `GET /api/v1/inventory`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListItemsParams {
    /// Case-insensitive substring of the item name.
    pub search: Option<String>,
    /// Restrict to one category.
    pub category: Option<String>,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size, capped at 100.
    pub limit: Option<u32>,
    /// `name`, `quantity`, `expiryDate` or `dateAdded`.
    pub sort_by: Option<ItemSortBy>,
    /// `asc` or `desc`.
    pub sort_order: Option<SortOrder>,
}

impl TryFrom<ListItemsParams> for ItemListQuery {
    type Error = Error;

    fn try_from(params: ListItemsParams) -> Result<Self, Self::Error> {
        let search = optional_text(params.search, FieldName::new("search"), SEARCH_MAX)?;
        let category = params
            .category
            .as_deref()
            .map(str::parse::<ItemCategory>)
            .transpose()
            .map_err(|err| invalid_field(FieldName::new("category"), err))?;
        Ok(Self {
            search,
            category,
            page: PageRequest::new(params.page, params.limit),
            sort_by: params.sort_by.unwrap_or_default(),
            sort_order: params.sort_order.unwrap_or_default(),
        })
    }
}

/// Body for `POST /api/v1/inventory`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[schema(example = "Milk")]
    pub name: String,
    #[schema(example = 2)]
    pub quantity: u32,
    /// Defaults to `pcs`.
    #[schema(example = "l")]
    pub unit: Option<String>,
    /// Defaults to `other`.
    #[schema(example = "dairy")]
    pub category: Option<String>,
    pub barcode: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "2024-03-20")]
    pub expiry_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<AddItemRequest> for NewInventoryItem {
    type Error = Error;

    fn try_from(body: AddItemRequest) -> Result<Self, Self::Error> {
        let name =
            ItemName::new(&body.name).map_err(|err| invalid_field(FieldName::new("name"), err))?;
        let quantity = ensure_item_quantity(body.quantity, FieldName::new("quantity"))?;
        let unit = match body.unit.as_deref() {
            None => ItemUnit::default(),
            Some(raw) => {
                ItemUnit::new(raw).map_err(|err| invalid_field(FieldName::new("unit"), err))?
            }
        };
        let category = parse_category(body.category.as_deref())?.unwrap_or_default();
        Ok(Self {
            name,
            quantity,
            unit,
            category,
            barcode: optional_text(body.barcode, FieldName::new("barcode"), BARCODE_MAX)?,
            expiry_date: body.expiry_date,
            image_url: optional_text(body.image_url, FieldName::new("imageUrl"), IMAGE_URL_MAX)?,
            notes: optional_notes(body.notes)?,
        })
    }
}

/// Body for `PATCH /api/v1/inventory/{id}`. Absent fields are left as is.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: Option<u32>,
    #[schema(value_type = Option<String>, format = Date)]
    pub expiry_date: Option<NaiveDate>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<UpdateItemRequest> for ItemPatch {
    type Error = Error;

    fn try_from(body: UpdateItemRequest) -> Result<Self, Self::Error> {
        let quantity = body
            .quantity
            .map(|value| ensure_item_quantity(value, FieldName::new("quantity")))
            .transpose()?;
        let name = body
            .name
            .as_deref()
            .map(ItemName::new)
            .transpose()
            .map_err(|err| invalid_field(FieldName::new("name"), err))?;
        Ok(Self {
            quantity,
            expiry_date: body.expiry_date,
            name,
            category: parse_category(body.category.as_deref())?,
            notes: optional_notes(body.notes)?,
        })
    }
}

fn parse_category(raw: Option<&str>) -> Result<Option<ItemCategory>, Error> {
    raw.map(str::parse::<ItemCategory>)
        .transpose()
        .map_err(|err| invalid_field(FieldName::new("category"), err))
}

/// List the caller's family inventory.
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(ListItemsParams),
    responses(
        (status = 200, description = "Page of items", body = ItemPageSchema),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "listItems"
)]
#[get("/inventory")]
pub async fn list_items(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    params: web::Query<ListItemsParams>,
) -> ApiResult<web::Json<Paginated<ClassifiedItem>>> {
    let query = ItemListQuery::try_from(params.into_inner())?;
    let page = state.inventory.list_items(user.user_id(), query).await?;
    Ok(web::Json(page))
}

/// Items at or below the family's low-stock threshold.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses(
        (status = 200, description = "Low-stock items", body = [ClassifiedItem]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "lowStockItems"
)]
#[get("/inventory/low-stock")]
pub async fn low_stock_items(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<ClassifiedItem>>> {
    let items = state.inventory.low_stock_items(user.user_id()).await?;
    Ok(web::Json(items))
}

/// Items expiring within the warning window, including expired ones.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/expiring",
    responses(
        (status = 200, description = "Expiring items", body = [ClassifiedItem]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "expiringItems"
)]
#[get("/inventory/expiring")]
pub async fn expiring_items(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<ClassifiedItem>>> {
    let items = state.inventory.expiring_items(user.user_id()).await?;
    Ok(web::Json(items))
}

/// Add an item, merging into an active item of the same name.
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Item added or merged", body = AddItemOutcome),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "addItem"
)]
#[post("/inventory")]
pub async fn add_item(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<AddItemRequest>,
) -> ApiResult<HttpResponse> {
    let item = NewInventoryItem::try_from(payload.into_inner())?;
    let outcome = state.inventory.add_item(user.user_id(), item).await?;
    Ok(HttpResponse::Created().json(outcome))
}

/// Partially update an item.
#[utoipa::path(
    patch,
    path = "/api/v1/inventory/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = UpdateItemOutcome),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Item not found", body = Error),
        (status = 409, description = "Name clashes with another item", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "updateItem"
)]
#[patch("/inventory/{id}")]
pub async fn update_item(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdateItemRequest>,
) -> ApiResult<web::Json<UpdateItemOutcome>> {
    let item_id: ItemId = parse_id(&path, FieldName::new("id"))?;
    let patch = ItemPatch::try_from(payload.into_inner())?;
    let outcome = state
        .inventory
        .update_item(user.user_id(), &item_id, patch)
        .await?;
    Ok(web::Json(outcome))
}

/// Soft-delete an item.
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Item not found", body = Error)
    ),
    tags = ["inventory"],
    operation_id = "deleteItem"
)]
#[delete("/inventory/{id}")]
pub async fn delete_item(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let item_id: ItemId = parse_id(&path, FieldName::new("id"))?;
    state.inventory.delete_item(user.user_id(), &item_id).await?;
    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
