//! Family directory API handlers.
//!
//! ```text
//! POST   /api/v1/families                         {"name":"Smiths"}
//! POST   /api/v1/families/join                    {"inviteCode":"K7Q2ZP"}
//! GET    /api/v1/families/me
//! PATCH  /api/v1/families/me/settings             {"lowStockThreshold":3}
//! POST   /api/v1/families/{id}/members            {"name":"Ann","phone":"+447700900123"}
//! DELETE /api/v1/families/{id}/members/{userId}
//! POST   /api/v1/families/leave
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::ports::{AddMemberRequest, FamilyMembership, FamilyOverview};
use crate::domain::{
    Error, Family, FamilyId, FamilyMember, FamilyName, FamilyRole, FamilySettingsPatch,
    InviteCode, PersonName, PhoneNumber, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field, parse_id};

/// Body for `POST /api/v1/families`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFamilyRequest {
    #[schema(example = "The Smiths")]
    pub name: String,
}

/// Body for `POST /api/v1/families/join`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinFamilyRequest {
    #[schema(example = "K7Q2ZP")]
    pub invite_code: String,
}

/// Body for `POST /api/v1/families/{id}/members`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberBody {
    #[schema(example = "Ann Smith")]
    pub name: String,
    #[schema(example = "+447700900123")]
    pub phone: String,
    /// `admin` or `member`; defaults to `member`.
    #[schema(example = "member")]
    pub role: Option<String>,
}

impl TryFrom<AddMemberBody> for AddMemberRequest {
    type Error = Error;

    fn try_from(body: AddMemberBody) -> Result<Self, Self::Error> {
        let name = PersonName::new(&body.name)
            .map_err(|err| invalid_field(FieldName::new("name"), err))?;
        let phone = PhoneNumber::new(&body.phone)
            .map_err(|err| invalid_field(FieldName::new("phone"), err))?;
        let role = match body.role.as_deref() {
            None => FamilyRole::Member,
            Some(raw) => raw
                .parse()
                .map_err(|err| invalid_field(FieldName::new("role"), err))?,
        };
        Ok(Self { name, phone, role })
    }
}

/// Create a family owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/families",
    request_body = CreateFamilyRequest,
    responses(
        (status = 201, description = "Family created", body = FamilyMembership),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Caller already belongs to a family", body = Error)
    ),
    tags = ["families"],
    operation_id = "createFamily"
)]
#[post("/families")]
pub async fn create_family(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreateFamilyRequest>,
) -> ApiResult<HttpResponse> {
    let name = FamilyName::new(&payload.name)
        .map_err(|err| invalid_field(FieldName::new("name"), err))?;
    let created = state.families.create_family(user.user_id(), name).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Join a family with its invite code.
#[utoipa::path(
    post,
    path = "/api/v1/families/join",
    request_body = JoinFamilyRequest,
    responses(
        (status = 200, description = "Joined", body = FamilyMembership),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown invite code", body = Error),
        (status = 409, description = "Caller already belongs to a family", body = Error)
    ),
    tags = ["families"],
    operation_id = "joinFamily"
)]
#[post("/families/join")]
pub async fn join_family(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<JoinFamilyRequest>,
) -> ApiResult<web::Json<FamilyMembership>> {
    let code = InviteCode::parse(&payload.invite_code)
        .map_err(|err| invalid_field(FieldName::new("inviteCode"), err))?;
    let joined = state.families.join_family(user.user_id(), code).await?;
    Ok(web::Json(joined))
}

/// Describe the caller's family, role and members.
#[utoipa::path(
    get,
    path = "/api/v1/families/me",
    responses(
        (status = 200, description = "Family overview", body = FamilyOverview),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["families"],
    operation_id = "currentFamily"
)]
#[get("/families/me")]
pub async fn current_family(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<FamilyOverview>> {
    let overview = state.families.family_overview(user.user_id()).await?;
    Ok(web::Json(overview))
}

/// Update settings of the caller's family. Owner or admin only.
#[utoipa::path(
    patch,
    path = "/api/v1/families/me/settings",
    request_body = FamilySettingsPatch,
    responses(
        (status = 200, description = "Settings updated", body = Family),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Role may not change settings", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["families"],
    operation_id = "updateFamilySettings"
)]
#[patch("/families/me/settings")]
pub async fn update_settings(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<FamilySettingsPatch>,
) -> ApiResult<web::Json<Family>> {
    let family = state
        .families
        .update_settings(user.user_id(), payload.into_inner())
        .await?;
    Ok(web::Json(family))
}

/// Add a member by phone number. Owner or admin only.
#[utoipa::path(
    post,
    path = "/api/v1/families/{id}/members",
    params(("id" = String, Path, description = "Family identifier")),
    request_body = AddMemberBody,
    responses(
        (status = 201, description = "Member added", body = FamilyMember),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Role may not add members", body = Error),
        (status = 404, description = "Family not found", body = Error),
        (status = 409, description = "User already belongs to a family", body = Error)
    ),
    tags = ["families"],
    operation_id = "addFamilyMember"
)]
#[post("/families/{id}/members")]
pub async fn add_member(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<AddMemberBody>,
) -> ApiResult<HttpResponse> {
    let family_id: FamilyId = parse_id(&path, FieldName::new("id"))?;
    let request = AddMemberRequest::try_from(payload.into_inner())?;
    let member = state
        .families
        .add_member(user.user_id(), &family_id, request)
        .await?;
    Ok(HttpResponse::Created().json(member))
}

/// Remove a member. Owner or admin only; owners cannot be removed.
#[utoipa::path(
    delete,
    path = "/api/v1/families/{id}/members/{userId}",
    params(
        ("id" = String, Path, description = "Family identifier"),
        ("userId" = String, Path, description = "Member's user identifier")
    ),
    responses(
        (status = 200, description = "Member removed"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Role may not remove this member", body = Error),
        (status = 404, description = "Family or member not found", body = Error)
    ),
    tags = ["families"],
    operation_id = "removeFamilyMember"
)]
#[delete("/families/{id}/members/{user_id}")]
pub async fn remove_member(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (family_raw, target_raw) = path.into_inner();
    let family_id: FamilyId = parse_id(&family_raw, FieldName::new("id"))?;
    let target: UserId = parse_id(&target_raw, FieldName::new("userId"))?;
    state
        .families
        .remove_member(user.user_id(), &family_id, &target)
        .await?;
    Ok(HttpResponse::Ok().finish())
}

/// Leave the caller's family. Owners cannot leave.
#[utoipa::path(
    post,
    path = "/api/v1/families/leave",
    responses(
        (status = 200, description = "Left the family"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Owners cannot leave", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["families"],
    operation_id = "leaveFamily"
)]
#[post("/families/leave")]
pub async fn leave_family(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    state.families.leave_family(user.user_id()).await?;
    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
#[path = "families_tests.rs"]
mod tests;
