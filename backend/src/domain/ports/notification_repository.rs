//! Port for notification and read-receipt persistence.
//!
//! Read receipts are keyed by `(notification, user)`; adapters must make
//! marking a notification read idempotent for that pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{PageRequest, Paginated};

use crate::domain::{FamilyId, Notification, NotificationId, NotificationView, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Port for notification storage. Reads cover every notification of
/// `family_id`; read state is reported for `user_id`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a notification.
    async fn create(&self, notification: &Notification) -> Result<(), NotificationRepositoryError>;

    /// Fetch a notification of the family.
    async fn find_in_family(
        &self,
        family_id: &FamilyId,
        notification_id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError>;

    /// Page through the family's notifications, newest first, with the
    /// user's read state.
    async fn list_for_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<NotificationView>, NotificationRepositoryError>;

    /// Upsert the read receipt for the pair, refreshing `read_at`.
    async fn mark_read(
        &self,
        notification_id: &NotificationId,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<(), NotificationRepositoryError>;

    /// Create receipts for every family notification the user has not read.
    /// Returns the number of receipts created.
    async fn mark_all_read(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError>;

    /// Count family notifications without a read receipt from the user.
    async fn unread_count(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<u64, NotificationRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationRepository;

#[async_trait]
impl NotificationRepository for FixtureNotificationRepository {
    async fn create(&self, _notification: &Notification) -> Result<(), NotificationRepositoryError> {
        Ok(())
    }

    async fn find_in_family(
        &self,
        _family_id: &FamilyId,
        _notification_id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        Ok(None)
    }

    async fn list_for_member(
        &self,
        _family_id: &FamilyId,
        _user_id: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<NotificationView>, NotificationRepositoryError> {
        Ok(Paginated::new(Vec::new(), 0, page))
    }

    async fn mark_read(
        &self,
        _notification_id: &NotificationId,
        _user_id: &UserId,
        _read_at: DateTime<Utc>,
    ) -> Result<(), NotificationRepositoryError> {
        Ok(())
    }

    async fn mark_all_read(
        &self,
        _family_id: &FamilyId,
        _user_id: &UserId,
        _read_at: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        Ok(0)
    }

    async fn unread_count(
        &self,
        _family_id: &FamilyId,
        _user_id: &UserId,
    ) -> Result<u64, NotificationRepositoryError> {
        Ok(0)
    }
}
