use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{EmailAddress, NotificationId, NotificationMessage, NotificationTitle};

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub user_email: EmailAddress,
    pub title: NotificationTitle,
    pub message: NotificationMessage,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewNotification {
    pub user_email: EmailAddress,
    pub title: NotificationTitle,
    pub message: NotificationMessage,
    pub link: Option<String>,
    pub created_at: NaiveDateTime,
}
