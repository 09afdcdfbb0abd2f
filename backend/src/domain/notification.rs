//! Family notifications and per-recipient read receipts.
//!
//! One notification row is addressed to a set of recipients; whether a given
//! recipient has read it is tracked separately, so reads by one member never
//! affect another member's unread count.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::family::FamilyId;
use super::identifier::define_identifier;
use super::user::UserId;

define_identifier! {
    /// Stable notification identifier.
    NotificationId
}

/// Maximum length of a notification title.
pub const NOTIFICATION_TITLE_MAX: usize = 100;
/// Maximum length of a notification message.
pub const NOTIFICATION_MESSAGE_MAX: usize = 500;

/// Validation errors for notification input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationValidationError {
    /// Title was blank.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Title exceeded the maximum length.
    #[error("title must be at most {max} characters")]
    TitleTooLong {
        /// Maximum permitted characters.
        max: usize,
    },
    /// Message was blank.
    #[error("message must not be empty")]
    EmptyMessage,
    /// Message exceeded the maximum length.
    #[error("message must be at most {max} characters")]
    MessageTooLong {
        /// Maximum permitted characters.
        max: usize,
    },
    /// Type string was not recognised.
    #[error("unknown notification type: {value}")]
    UnknownType {
        /// Rejected input.
        value: String,
    },
}

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// An item dropped to the low-stock threshold.
    LowStock,
    /// An item is about to expire.
    ExpiringSoon,
    /// An item has expired.
    Expired,
    /// A new item was added.
    NewItem,
    /// An order was created.
    OrderCreated,
    /// An order was completed.
    OrderCompleted,
    /// A member joined the family.
    MemberJoined,
    /// Free-form broadcast from a member.
    Custom,
}

impl NotificationType {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowStock => "low_stock",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
            Self::NewItem => "new_item",
            Self::OrderCreated => "order_created",
            Self::OrderCompleted => "order_completed",
            Self::MemberJoined => "member_joined",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for NotificationType {
    type Err = NotificationValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_stock" => Ok(Self::LowStock),
            "expiring_soon" => Ok(Self::ExpiringSoon),
            "expired" => Ok(Self::Expired),
            "new_item" => Ok(Self::NewItem),
            "order_created" => Ok(Self::OrderCreated),
            "order_completed" => Ok(Self::OrderCompleted),
            "member_joined" => Ok(Self::MemberJoined),
            "custom" => Ok(Self::Custom),
            other => Err(NotificationValidationError::UnknownType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Title and body of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationText {
    title: String,
    message: String,
}

impl NotificationText {
    /// Validate a title and message pair.
    ///
    /// # Examples
    /// ```
    /// use pantry::domain::NotificationText;
    ///
    /// let text = NotificationText::new("Low stock", "Milk is running low").expect("valid");
    /// assert_eq!(text.title(), "Low stock");
    /// ```
    pub fn new(
        title: impl AsRef<str>,
        message: impl AsRef<str>,
    ) -> Result<Self, NotificationValidationError> {
        let title = title.as_ref().trim();
        let message = message.as_ref().trim();
        if title.is_empty() {
            return Err(NotificationValidationError::EmptyTitle);
        }
        if title.chars().count() > NOTIFICATION_TITLE_MAX {
            return Err(NotificationValidationError::TitleTooLong {
                max: NOTIFICATION_TITLE_MAX,
            });
        }
        if message.is_empty() {
            return Err(NotificationValidationError::EmptyMessage);
        }
        if message.chars().count() > NOTIFICATION_MESSAGE_MAX {
            return Err(NotificationValidationError::MessageTooLong {
                max: NOTIFICATION_MESSAGE_MAX,
            });
        }
        Ok(Self {
            title: title.to_owned(),
            message: message.to_owned(),
        })
    }

    /// Notification title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Notification body.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Stable identifier.
    pub id: NotificationId,
    /// Owning family.
    pub family_id: FamilyId,
    /// Kind of notification.
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Title.
    pub title: String,
    /// Body.
    pub message: String,
    /// Structured payload for clients, such as the related item id.
    #[schema(value_type = Object)]
    pub data: Value,
    /// Users the notification is addressed to.
    pub recipients: Vec<UserId>,
    /// Member who broadcast it; absent for system notifications.
    pub sent_by: Option<UserId>,
    /// When it was sent.
    pub sent_at: DateTime<Utc>,
}

impl Notification {
    /// Whether `user_id` is among the recipients.
    pub fn is_addressed_to(&self, user_id: &UserId) -> bool {
        self.recipients.contains(user_id)
    }
}

/// Input for fanning out a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Kind of notification.
    pub kind: NotificationType,
    /// Title and body.
    pub text: NotificationText,
    /// Structured payload.
    pub data: Value,
    /// Explicit recipients; empty means every active member.
    pub recipients: Vec<UserId>,
    /// Member who broadcast it.
    pub sent_by: Option<UserId>,
}

impl NewNotification {
    /// System notification addressed to every active member.
    pub fn broadcast(kind: NotificationType, text: NotificationText, data: Value) -> Self {
        Self {
            kind,
            text,
            data,
            recipients: Vec::new(),
            sent_by: None,
        }
    }
}

/// Notification as seen by one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    /// The notification.
    #[serde(flatten)]
    pub notification: Notification,
    /// Whether this recipient has read it.
    pub is_read: bool,
    /// When this recipient last marked it read.
    pub read_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "body", NotificationValidationError::EmptyTitle)]
    #[case("title", "  ", NotificationValidationError::EmptyMessage)]
    fn text_rejects_blank_parts(
        #[case] title: &str,
        #[case] message: &str,
        #[case] expected: NotificationValidationError,
    ) {
        assert_eq!(NotificationText::new(title, message), Err(expected));
    }

    #[rstest]
    fn text_rejects_long_message() {
        let long = "m".repeat(NOTIFICATION_MESSAGE_MAX + 1);
        assert!(matches!(
            NotificationText::new("title", long),
            Err(NotificationValidationError::MessageTooLong { .. })
        ));
    }

    #[rstest]
    fn type_round_trips_through_storage_form() {
        for kind in [
            NotificationType::LowStock,
            NotificationType::ExpiringSoon,
            NotificationType::OrderCompleted,
            NotificationType::Custom,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationType>(), Ok(kind));
        }
    }

    #[rstest]
    fn view_serialises_type_and_read_flag() {
        let recipient = UserId::random();
        let view = NotificationView {
            notification: Notification {
                id: NotificationId::random(),
                family_id: FamilyId::random(),
                kind: NotificationType::NewItem,
                title: "New item".to_owned(),
                message: "Milk was added".to_owned(),
                data: serde_json::json!({}),
                recipients: vec![recipient],
                sent_by: None,
                sent_at: Utc::now(),
            },
            is_read: false,
            read_at: None,
        };
        let value = serde_json::to_value(&view).expect("serialise");
        assert_eq!(value["type"], "new_item");
        assert_eq!(value["isRead"], false);
        assert!(view.notification.is_addressed_to(&recipient));
    }
}
