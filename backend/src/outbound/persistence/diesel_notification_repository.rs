//! PostgreSQL-backed `NotificationRepository` implementation using Diesel ORM.
//!
//! Recipients are stored as a `UUID[]` on the notification. Every member of
//! the family sees every family notification; read receipts live in
//! `notification_reads`, one per `(notification, user)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types;
use diesel_async::RunQueryDsl;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{FamilyId, Notification, NotificationId, NotificationView, UserId};

use super::diesel_helpers::{
    collect_rows, count_from_db, map_basic_diesel_error, map_basic_pool_error, page_window,
};
use super::models::{NewNotificationReadRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{notification_reads, notifications};

/// Receipts for every notification of family `$1` that `$2` has not read.
const MARK_ALL_READ_SQL: &str = "\
INSERT INTO notification_reads (notification_id, user_id, read_at) \
SELECT n.id, $2, $3 FROM notifications n \
WHERE n.family_id = $1 \
  AND NOT EXISTS ( \
    SELECT 1 FROM notification_reads r \
    WHERE r.notification_id = n.id AND r.user_id = $2) \
ON CONFLICT (notification_id, user_id) DO NOTHING";

/// Diesel-backed implementation of the [`NotificationRepository`] port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> NotificationRepositoryError {
    map_basic_pool_error(error, NotificationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> NotificationRepositoryError {
    map_basic_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::connection,
    )
}

fn notification_to_row(notification: &Notification) -> NotificationRow {
    NotificationRow {
        id: *notification.id.as_uuid(),
        family_id: *notification.family_id.as_uuid(),
        kind: notification.kind.as_str().to_owned(),
        title: notification.title.clone(),
        message: notification.message.clone(),
        data: notification.data.clone(),
        recipient_ids: notification.recipients.iter().copied().map(Uuid::from).collect(),
        sent_by: notification.sent_by.map(Uuid::from),
        sent_at: notification.sent_at,
    }
}

fn row_to_notification(row: NotificationRow) -> Result<Notification, String> {
    let kind = row
        .kind
        .parse()
        .map_err(|err| format!("notification {}: {err}", row.id))?;
    Ok(Notification {
        id: NotificationId::new(row.id),
        family_id: FamilyId::new(row.family_id),
        kind,
        title: row.title,
        message: row.message,
        data: row.data,
        recipients: row.recipient_ids.into_iter().map(UserId::new).collect(),
        sent_by: row.sent_by.map(UserId::new),
        sent_at: row.sent_at,
    })
}

fn row_to_view(
    (row, read_at): (NotificationRow, Option<DateTime<Utc>>),
) -> Result<NotificationView, String> {
    Ok(NotificationView {
        notification: row_to_notification(row)?,
        is_read: read_at.is_some(),
        read_at,
    })
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        let row = notification_to_row(notification);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(notifications::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_in_family(
        &self,
        family_id: &FamilyId,
        notification_id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<NotificationRow> = notifications::table
            .filter(notifications::id.eq(notification_id.as_uuid()))
            .filter(notifications::family_id.eq(family_id.as_uuid()))
            .select(NotificationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_notification)
            .transpose()
            .map_err(NotificationRepositoryError::query)
    }

    async fn list_for_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<NotificationView>, NotificationRepositoryError> {
        let family = *family_id.as_uuid();
        let user = *user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = notifications::table
            .filter(notifications::family_id.eq(family))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let (limit, offset) = page_window(page);
        let rows: Vec<(NotificationRow, Option<DateTime<Utc>>)> = notifications::table
            .left_join(
                notification_reads::table.on(notification_reads::notification_id
                    .eq(notifications::id)
                    .and(notification_reads::user_id.eq(user))),
            )
            .filter(notifications::family_id.eq(family))
            .order_by((notifications::sent_at.desc(), notifications::id.asc()))
            .select((
                NotificationRow::as_select(),
                notification_reads::read_at.nullable(),
            ))
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let views = collect_rows(
            rows.into_iter().map(row_to_view),
            NotificationRepositoryError::query,
        )?;
        Ok(Paginated::new(views, count_from_db(total), page))
    }

    async fn mark_read(
        &self,
        notification_id: &NotificationId,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<(), NotificationRepositoryError> {
        let receipt = NewNotificationReadRow {
            notification_id: *notification_id.as_uuid(),
            user_id: *user_id.as_uuid(),
            read_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(notification_reads::table)
            .values(&receipt)
            .on_conflict((notification_reads::notification_id, notification_reads::user_id))
            .do_update()
            .set(notification_reads::read_at.eq(read_at))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn mark_all_read(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::sql_query(MARK_ALL_READ_SQL)
            .bind::<sql_types::Uuid, _>(*family_id.as_uuid())
            .bind::<sql_types::Uuid, _>(*user_id.as_uuid())
            .bind::<sql_types::Timestamptz, _>(read_at)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(inserted).unwrap_or_default())
    }

    async fn unread_count(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<u64, NotificationRepositoryError> {
        let user = *user_id.as_uuid();
        let read_ids = notification_reads::table
            .filter(notification_reads::user_id.eq(user))
            .select(notification_reads::notification_id);

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = notifications::table
            .filter(notifications::family_id.eq(family_id.as_uuid()))
            .filter(notifications::id.ne_all(read_ids))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_from_db(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotificationType;
    use rstest::rstest;
    use serde_json::json;

    fn notification() -> Notification {
        Notification {
            id: NotificationId::random(),
            family_id: FamilyId::random(),
            kind: NotificationType::LowStock,
            title: "Low stock".to_owned(),
            message: "Milk is running low".to_owned(),
            data: json!({ "itemId": "42" }),
            recipients: vec![UserId::random(), UserId::random()],
            sent_by: None,
            sent_at: Utc::now(),
        }
    }

    #[rstest]
    fn rows_round_trip_recipients_and_payload() {
        let source = notification();
        let rebuilt = row_to_notification(notification_to_row(&source)).expect("notification");
        assert_eq!(rebuilt, source);
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(Utc::now()), true)]
    fn read_state_follows_receipt(#[case] read_at: Option<DateTime<Utc>>, #[case] is_read: bool) {
        let view = row_to_view((notification_to_row(&notification()), read_at)).expect("view");
        assert_eq!(view.is_read, is_read);
        assert_eq!(view.read_at, read_at);
    }

    #[rstest]
    fn unknown_kind_is_reported() {
        let mut row = notification_to_row(&notification());
        row.kind = "telegram".to_owned();
        assert!(row_to_notification(row).is_err());
    }
}
