//! Driving ports for notification fan-out and read tracking.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    Error, FamilyId, NewNotification, Notification, NotificationId, NotificationText,
    NotificationView, UserId,
};

/// A page of the caller's notifications with their total unread count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    /// Page of notifications.
    pub notifications: Paginated<NotificationView>,
    /// Unread notifications across all pages.
    pub unread_count: u64,
}

/// Member broadcast request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendNotificationRequest {
    /// Title and body.
    pub text: NotificationText,
    /// Explicit recipients; empty means every active member.
    pub recipients: Vec<UserId>,
    /// Structured payload.
    pub data: Value,
}

/// Fan-out primitive used by other components for side-effect
/// notifications.
///
/// No membership check is made: callers have already resolved the family.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Create one notification for the family. Empty recipients default to
    /// every active member; explicit recipients must all be active members.
    async fn notify(
        &self,
        family_id: &FamilyId,
        notification: NewNotification,
    ) -> Result<Notification, Error>;
}

/// Driving port for a member's notification inbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Page through the caller's family notifications with their read state.
    async fn list_notifications(
        &self,
        caller: &UserId,
        page: PageRequest,
    ) -> Result<NotificationFeed, Error>;

    /// Count the caller's unread notifications.
    async fn unread_count(&self, caller: &UserId) -> Result<u64, Error>;

    /// Mark one notification read. Repeated calls are harmless.
    async fn mark_read(&self, caller: &UserId, notification_id: &NotificationId)
    -> Result<(), Error>;

    /// Mark every unread notification read; returns how many were marked.
    async fn mark_all_read(&self, caller: &UserId) -> Result<u64, Error>;

    /// Broadcast a custom notification to the caller's family.
    async fn send(
        &self,
        caller: &UserId,
        request: SendNotificationRequest,
    ) -> Result<Notification, Error>;
}

/// Fixture notifier that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotifier;

#[async_trait]
impl Notifier for FixtureNotifier {
    async fn notify(
        &self,
        family_id: &FamilyId,
        notification: NewNotification,
    ) -> Result<Notification, Error> {
        Ok(Notification {
            id: NotificationId::random(),
            family_id: *family_id,
            kind: notification.kind,
            title: notification.text.title().to_owned(),
            message: notification.text.message().to_owned(),
            data: notification.data,
            recipients: notification.recipients,
            sent_by: notification.sent_by,
            sent_at: chrono::Utc::now(),
        })
    }
}

/// Fixture inbox for running without a database.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationCenter;

#[async_trait]
impl NotificationCenter for FixtureNotificationCenter {
    async fn list_notifications(
        &self,
        _caller: &UserId,
        page: PageRequest,
    ) -> Result<NotificationFeed, Error> {
        Ok(NotificationFeed {
            notifications: Paginated::new(Vec::new(), 0, page),
            unread_count: 0,
        })
    }

    async fn unread_count(&self, _caller: &UserId) -> Result<u64, Error> {
        Ok(0)
    }

    async fn mark_read(
        &self,
        _caller: &UserId,
        _notification_id: &NotificationId,
    ) -> Result<(), Error> {
        Err(Error::not_found("notification not found"))
    }

    async fn mark_all_read(&self, _caller: &UserId) -> Result<u64, Error> {
        Ok(0)
    }

    async fn send(
        &self,
        _caller: &UserId,
        _request: SendNotificationRequest,
    ) -> Result<Notification, Error> {
        Err(Error::not_part_of_family())
    }
}
