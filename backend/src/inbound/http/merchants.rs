//! Merchant registry API handlers.

use actix_web::{HttpResponse, delete, get, patch, post, web};
use pagination::Paginated;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    Error, ItemCategory, Merchant, MerchantContact, MerchantId, MerchantName, MerchantPatch,
    MerchantType, NewMerchant,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::{MerchantPageSchema, PageParams};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field, invalid_list_entry, optional_notes, optional_text, parse_id,
};

const PHONE_MAX: usize = 32;
const EMAIL_MAX: usize = 254;
const ADDRESS_MAX: usize = 200;

/// Body for `POST /api/v1/merchants`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMerchantRequest {
    #[schema(example = "Corner Shop")]
    pub name: String,
    /// Defaults to `other`.
    #[schema(example = "grocery")]
    pub merchant_type: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    #[schema(example = json!(["dairy", "bakery"]))]
    pub categories: Vec<String>,
    pub notes: Option<String>,
}

impl TryFrom<CreateMerchantRequest> for NewMerchant {
    type Error = Error;

    fn try_from(body: CreateMerchantRequest) -> Result<Self, Self::Error> {
        let name = MerchantName::new(&body.name)
            .map_err(|err| invalid_field(FieldName::new("name"), err))?;
        let merchant_type = parse_type(body.merchant_type.as_deref())?.unwrap_or_default();
        Ok(Self {
            name,
            merchant_type,
            contact: MerchantContact {
                phone: optional_text(body.phone, FieldName::new("phone"), PHONE_MAX)?,
                email: optional_text(body.email, FieldName::new("email"), EMAIL_MAX)?,
                address: optional_text(body.address, FieldName::new("address"), ADDRESS_MAX)?,
            },
            categories: parse_categories(&body.categories)?,
            notes: optional_notes(body.notes)?,
        })
    }
}

/// Body for `PATCH /api/v1/merchants/{id}`. Absent fields are left as is.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMerchantRequest {
    pub name: Option<String>,
    pub merchant_type: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Replaces the whole category list when present.
    pub categories: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl TryFrom<UpdateMerchantRequest> for MerchantPatch {
    type Error = Error;

    fn try_from(body: UpdateMerchantRequest) -> Result<Self, Self::Error> {
        let name = body
            .name
            .as_deref()
            .map(MerchantName::new)
            .transpose()
            .map_err(|err| invalid_field(FieldName::new("name"), err))?;
        let categories = body
            .categories
            .as_deref()
            .map(parse_categories)
            .transpose()?;
        Ok(Self {
            name,
            merchant_type: parse_type(body.merchant_type.as_deref())?,
            phone: optional_text(body.phone, FieldName::new("phone"), PHONE_MAX)?,
            email: optional_text(body.email, FieldName::new("email"), EMAIL_MAX)?,
            address: optional_text(body.address, FieldName::new("address"), ADDRESS_MAX)?,
            categories,
            notes: optional_notes(body.notes)?,
        })
    }
}

fn parse_type(raw: Option<&str>) -> Result<Option<MerchantType>, Error> {
    raw.map(str::parse::<MerchantType>)
        .transpose()
        .map_err(|err| invalid_field(FieldName::new("merchantType"), err))
}

fn parse_categories(raw: &[String]) -> Result<Vec<ItemCategory>, Error> {
    let mut categories = Vec::with_capacity(raw.len());
    for (index, value) in raw.iter().enumerate() {
        let category = value
            .parse::<ItemCategory>()
            .map_err(|err| invalid_list_entry(FieldName::new("categories"), index, err))?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    Ok(categories)
}

/// List active merchants of the caller's family.
#[utoipa::path(
    get,
    path = "/api/v1/merchants",
    params(PageParams),
    responses(
        (status = 200, description = "Page of merchants", body = MerchantPageSchema),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["merchants"],
    operation_id = "listMerchants"
)]
#[get("/merchants")]
pub async fn list_merchants(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<Merchant>>> {
    let page = state
        .merchants
        .list_merchants(user.user_id(), params.into_inner().into())
        .await?;
    Ok(web::Json(page))
}

/// Create a merchant.
#[utoipa::path(
    post,
    path = "/api/v1/merchants",
    request_body = CreateMerchantRequest,
    responses(
        (status = 201, description = "Merchant created", body = Merchant),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["merchants"],
    operation_id = "createMerchant"
)]
#[post("/merchants")]
pub async fn create_merchant(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreateMerchantRequest>,
) -> ApiResult<HttpResponse> {
    let merchant = NewMerchant::try_from(payload.into_inner())?;
    let created = state
        .merchants
        .create_merchant(user.user_id(), merchant)
        .await?;
    Ok(HttpResponse::Created().json(created))
}

/// Fetch one merchant.
#[utoipa::path(
    get,
    path = "/api/v1/merchants/{id}",
    params(("id" = String, Path, description = "Merchant identifier")),
    responses(
        (status = 200, description = "Merchant", body = Merchant),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Merchant not found", body = Error)
    ),
    tags = ["merchants"],
    operation_id = "getMerchant"
)]
#[get("/merchants/{id}")]
pub async fn get_merchant(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Merchant>> {
    let merchant_id: MerchantId = parse_id(&path, FieldName::new("id"))?;
    let merchant = state
        .merchants
        .get_merchant(user.user_id(), &merchant_id)
        .await?;
    Ok(web::Json(merchant))
}

/// Partially update a merchant.
#[utoipa::path(
    patch,
    path = "/api/v1/merchants/{id}",
    params(("id" = String, Path, description = "Merchant identifier")),
    request_body = UpdateMerchantRequest,
    responses(
        (status = 200, description = "Merchant updated", body = Merchant),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Merchant not found", body = Error)
    ),
    tags = ["merchants"],
    operation_id = "updateMerchant"
)]
#[patch("/merchants/{id}")]
pub async fn update_merchant(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdateMerchantRequest>,
) -> ApiResult<web::Json<Merchant>> {
    let merchant_id: MerchantId = parse_id(&path, FieldName::new("id"))?;
    let patch = MerchantPatch::try_from(payload.into_inner())?;
    let merchant = state
        .merchants
        .update_merchant(user.user_id(), &merchant_id, patch)
        .await?;
    Ok(web::Json(merchant))
}

/// Soft-delete a merchant.
#[utoipa::path(
    delete,
    path = "/api/v1/merchants/{id}",
    params(("id" = String, Path, description = "Merchant identifier")),
    responses(
        (status = 200, description = "Merchant deleted"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Merchant not found", body = Error)
    ),
    tags = ["merchants"],
    operation_id = "deleteMerchant"
)]
#[delete("/merchants/{id}")]
pub async fn delete_merchant(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let merchant_id: MerchantId = parse_id(&path, FieldName::new("id"))?;
    state
        .merchants
        .delete_merchant(user.user_id(), &merchant_id)
        .await?;
    Ok(HttpResponse::Ok().finish())
}
