//! Data models for the notifications domain.

use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// What happened that the user is being told about.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "notification_type")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[sea_orm(string_value = "EMAIL_VERIFIED")]
    EmailVerified,
    #[sea_orm(string_value = "NEW_BID")]
    NewBid,
    #[sea_orm(string_value = "BID_ACCEPTED")]
    BidAccepted,
    #[sea_orm(string_value = "BID_REJECTED")]
    BidRejected,
    #[sea_orm(string_value = "TASK_CANCELLED")]
    TaskCancelled,
    #[sea_orm(string_value = "TASK_IN_REVIEW")]
    TaskInReview,
    #[sea_orm(string_value = "TASK_COMPLETED")]
    TaskCompleted,
    #[sea_orm(string_value = "MILESTONES_CREATED")]
    MilestonesCreated,
    #[sea_orm(string_value = "MILESTONE_SUBMITTED")]
    MilestoneSubmitted,
    #[sea_orm(string_value = "REVISION_REQUESTED")]
    RevisionRequested,
    #[sea_orm(string_value = "PAYMENT_RELEASED")]
    PaymentReleased,
    #[sea_orm(string_value = "PAYMENT_CONFIRMED")]
    PaymentConfirmed,
    #[sea_orm(string_value = "PAYMENT_FAILED")]
    PaymentFailed,
    #[sea_orm(string_value = "NEW_MESSAGE")]
    NewMessage,
    #[sea_orm(string_value = "ACCOUNT_STATUS_CHANGED")]
    AccountStatusChanged,
}

/// A persisted notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    /// Recipient
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    /// Client-side route the notification links to
    pub url: String,
    pub task_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification that has been decided on but not stored yet.
///
/// Services build these; the effect dispatcher persists them after the
/// triggering change has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub message: String,
    pub url: String,
    pub task_id: Option<Uuid>,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        notification_type: NotificationType,
        message: impl Into<String>,
        url: impl Into<String>,
        task_id: Option<Uuid>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            message: message.into(),
            url: url.into(),
            task_id,
        }
    }

    pub(crate) fn into_notification(self) -> Notification {
        Notification {
            id: Uuid::now_v7(),
            user_id: self.user_id,
            notification_type: self.notification_type,
            message: self.message,
            url: self.url,
            task_id: self.task_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Query parameters for listing notifications
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    /// Only return unread notifications
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkedRead {
    /// Number of notifications flipped to read
    pub updated: u64,
}
