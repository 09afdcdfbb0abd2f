//! Notification inbox API handlers.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::ports::{NotificationFeed, SendNotificationRequest};
use crate::domain::{
    Error, Notification, NotificationId, NotificationText, NotificationValidationError, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::{NotificationFeedSchema, PageParams};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field, invalid_list_entry, parse_id};

/// Body for `POST /api/v1/notifications/send`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationBody {
    #[schema(example = "Dinner")]
    pub title: String,
    #[schema(example = "Pizza tonight, nothing to buy")]
    pub message: String,
    /// Member user ids; empty or absent means the whole family.
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Free-form payload passed through to clients.
    #[schema(value_type = Object)]
    pub data: Option<Value>,
}

impl TryFrom<SendNotificationBody> for SendNotificationRequest {
    type Error = Error;

    fn try_from(body: SendNotificationBody) -> Result<Self, Self::Error> {
        let text = NotificationText::new(&body.title, &body.message).map_err(|err| {
            let field = match &err {
                NotificationValidationError::EmptyMessage
                | NotificationValidationError::MessageTooLong { .. } => "message",
                _ => "title",
            };
            invalid_field(FieldName::new(field), err)
        })?;
        let mut recipients: Vec<UserId> = Vec::with_capacity(body.recipients.len());
        for (index, raw) in body.recipients.iter().enumerate() {
            let user_id = raw
                .trim()
                .parse::<UserId>()
                .map_err(|err| invalid_list_entry(FieldName::new("recipients"), index, err))?;
            if !recipients.contains(&user_id) {
                recipients.push(user_id);
            }
        }
        Ok(Self {
            text,
            recipients,
            data: body.data.unwrap_or(Value::Null),
        })
    }
}

/// Unread notification count.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    #[schema(example = 3)]
    pub unread_count: u64,
}

/// Result of marking everything read.
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    /// Notifications newly marked read.
    #[schema(example = 3)]
    pub marked: u64,
}

/// Page through the family's notifications with the caller's read state, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(PageParams),
    responses(
        (status = 200, description = "Notification feed", body = NotificationFeedSchema),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<NotificationFeed>> {
    let feed = state
        .notifications
        .list_notifications(user.user_id(), params.into_inner().into())
        .await?;
    Ok(web::Json(feed))
}

/// Count unread notifications.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "unreadCount"
)]
#[get("/notifications/unread-count")]
pub async fn unread_count(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<UnreadCountResponse>> {
    let unread_count = state.notifications.unread_count(user.user_id()).await?;
    Ok(web::Json(UnreadCountResponse { unread_count }))
}

/// Mark every notification read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Notifications marked read", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markAllRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<MarkAllReadResponse>> {
    let marked = state.notifications.mark_all_read(user.user_id()).await?;
    Ok(web::Json(MarkAllReadResponse { marked }))
}

/// Mark one notification read. Marking twice is not an error.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Notification marked read"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Notification not found", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markRead"
)]
#[post("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let notification_id: NotificationId = parse_id(&path, FieldName::new("id"))?;
    state
        .notifications
        .mark_read(user.user_id(), &notification_id)
        .await?;
    Ok(HttpResponse::Ok().finish())
}

/// Send a custom notification to the family.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/send",
    request_body = SendNotificationBody,
    responses(
        (status = 201, description = "Notification sent", body = Notification),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Caller is not part of a family", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "sendNotification"
)]
#[post("/notifications/send")]
pub async fn send_notification(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<SendNotificationBody>,
) -> ApiResult<HttpResponse> {
    let request = SendNotificationRequest::try_from(payload.into_inner())?;
    let sent = state.notifications.send(user.user_id(), request).await?;
    Ok(HttpResponse::Created().json(sent))
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;
