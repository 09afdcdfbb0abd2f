//! Notification fan-out and per-recipient read tracking.
//!
//! [`NotificationFanout`] writes one notification row addressed to a set of
//! recipients. [`NotificationService`] is the member-facing inbox; it derives
//! the caller's family from the directory and tracks the caller's read state
//! over every notification of that family.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::PageRequest;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::domain::ports::{
    FamilyDirectory, FamilyRepository, FamilyRepositoryError, NotificationCenter,
    NotificationFeed, NotificationRepository, NotificationRepositoryError, Notifier,
    SendNotificationRequest,
};
use crate::domain::{
    Error, FamilyId, NewNotification, Notification, NotificationId, NotificationText,
    NotificationType, UserId,
};

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => Error::service_unavailable(
            format!("notification repository unavailable: {message}"),
        ),
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

fn map_family_error(error: FamilyRepositoryError) -> Error {
    match error {
        FamilyRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("family repository unavailable: {message}"))
        }
        other => Error::internal(format!("family repository error: {other}")),
    }
}

/// Send a system notification, logging instead of failing when it cannot be
/// delivered. The triggering operation has already committed by then.
pub(crate) async fn notify_quietly<N>(
    notifier: &N,
    family_id: &FamilyId,
    kind: NotificationType,
    title: &str,
    message: String,
    data: Value,
) where
    N: Notifier + ?Sized,
{
    let text = match NotificationText::new(title, &message) {
        Ok(text) => text,
        Err(error) => {
            warn!(%family_id, kind = kind.as_str(), %error, "skipping malformed notification");
            return;
        }
    };
    let notification = NewNotification::broadcast(kind, text, data);
    if let Err(error) = notifier.notify(family_id, notification).await {
        warn!(
            %family_id,
            kind = kind.as_str(),
            error = %error,
            "side-effect notification failed"
        );
    }
}

/// Writes notifications addressed to family members.
#[derive(Clone)]
pub struct NotificationFanout<R, F> {
    notifications: Arc<R>,
    families: Arc<F>,
    clock: Arc<dyn Clock>,
}

impl<R, F> NotificationFanout<R, F> {
    /// Create a fan-out over the given repositories.
    pub fn new(notifications: Arc<R>, families: Arc<F>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notifications,
            families,
            clock,
        }
    }
}

impl<R, F> NotificationFanout<R, F>
where
    R: NotificationRepository,
    F: FamilyRepository,
{
    async fn resolve_recipients(
        &self,
        family_id: &FamilyId,
        requested: Vec<UserId>,
    ) -> Result<Vec<UserId>, Error> {
        let members: Vec<UserId> = self
            .families
            .list_members(family_id)
            .await
            .map_err(map_family_error)?
            .into_iter()
            .map(|member| member.user_id)
            .collect();
        if requested.is_empty() {
            return Ok(members);
        }

        let mut recipients: Vec<UserId> = Vec::with_capacity(requested.len());
        for user_id in requested {
            if !members.contains(&user_id) {
                return Err(
                    Error::invalid_request("recipients must be active family members")
                        .with_details(json!({
                            "field": "recipients",
                            "code": "not_a_member",
                            "userId": user_id,
                        })),
                );
            }
            if !recipients.contains(&user_id) {
                recipients.push(user_id);
            }
        }
        Ok(recipients)
    }
}

#[async_trait]
impl<R, F> Notifier for NotificationFanout<R, F>
where
    R: NotificationRepository,
    F: FamilyRepository,
{
    async fn notify(
        &self,
        family_id: &FamilyId,
        notification: NewNotification,
    ) -> Result<Notification, Error> {
        let recipients = self
            .resolve_recipients(family_id, notification.recipients)
            .await?;
        let record = Notification {
            id: NotificationId::random(),
            family_id: *family_id,
            kind: notification.kind,
            title: notification.text.title().to_owned(),
            message: notification.text.message().to_owned(),
            data: notification.data,
            recipients,
            sent_by: notification.sent_by,
            sent_at: self.clock.utc(),
        };
        self.notifications
            .create(&record)
            .await
            .map_err(map_notification_error)?;
        debug!(
            notification_id = %record.id,
            %family_id,
            kind = record.kind.as_str(),
            recipients = record.recipients.len(),
            "notification fanned out"
        );
        Ok(record)
    }
}

/// Member inbox implementing [`NotificationCenter`].
#[derive(Clone)]
pub struct NotificationService<R, D, N> {
    notifications: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, D, N> NotificationService<R, D, N> {
    /// Create the inbox service.
    pub fn new(
        notifications: Arc<R>,
        directory: Arc<D>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            directory,
            notifier,
            clock,
        }
    }
}

#[async_trait]
impl<R, D, N> NotificationCenter for NotificationService<R, D, N>
where
    R: NotificationRepository,
    D: FamilyDirectory,
    N: Notifier,
{
    async fn list_notifications(
        &self,
        caller: &UserId,
        page: PageRequest,
    ) -> Result<NotificationFeed, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let notifications = self
            .notifications
            .list_for_member(&membership.family_id, caller, page)
            .await
            .map_err(map_notification_error)?;
        let unread_count = self
            .notifications
            .unread_count(&membership.family_id, caller)
            .await
            .map_err(map_notification_error)?;
        Ok(NotificationFeed {
            notifications,
            unread_count,
        })
    }

    async fn unread_count(&self, caller: &UserId) -> Result<u64, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        self.notifications
            .unread_count(&membership.family_id, caller)
            .await
            .map_err(map_notification_error)
    }

    async fn mark_read(
        &self,
        caller: &UserId,
        notification_id: &NotificationId,
    ) -> Result<(), Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        self.notifications
            .find_in_family(&membership.family_id, notification_id)
            .await
            .map_err(map_notification_error)?
            .ok_or_else(|| Error::not_found("notification not found"))?;
        self.notifications
            .mark_read(notification_id, caller, self.clock.utc())
            .await
            .map_err(map_notification_error)
    }

    async fn mark_all_read(&self, caller: &UserId) -> Result<u64, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        self.notifications
            .mark_all_read(&membership.family_id, caller, self.clock.utc())
            .await
            .map_err(map_notification_error)
    }

    async fn send(
        &self,
        caller: &UserId,
        request: SendNotificationRequest,
    ) -> Result<Notification, Error> {
        let membership = self.directory.resolve_membership(caller).await?;
        let notification = NewNotification {
            kind: NotificationType::Custom,
            text: request.text,
            data: request.data,
            recipients: request.recipients,
            sent_by: Some(*caller),
        };
        self.notifier
            .notify(&membership.family_id, notification)
            .await
    }
}

#[cfg(test)]
#[path = "notification_service_tests.rs"]
mod tests;
