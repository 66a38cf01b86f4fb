use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::notification::{
    NewNotification as DomainNewNotification, Notification as DomainNotification,
};
use crate::domain::types::{
    EmailAddress, NotificationId, NotificationMessage, NotificationTitle, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::notifications)]
pub struct Notification {
    pub id: i32,
    pub user_email: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification<'a> {
    pub user_email: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub link: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Notification> for DomainNotification {
    type Error = TypeConstraintError;

    fn try_from(notification: Notification) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NotificationId::new(notification.id)?,
            user_email: EmailAddress::new(notification.user_email)?,
            title: NotificationTitle::new(notification.title)?,
            message: NotificationMessage::new(notification.message)?,
            link: notification.link,
            is_read: notification.is_read,
            created_at: notification.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewNotification> for NewNotification<'a> {
    fn from(notification: &'a DomainNewNotification) -> Self {
        Self {
            user_email: notification.user_email.as_str(),
            title: notification.title.as_str(),
            message: notification.message.as_str(),
            link: notification.link.as_deref(),
            created_at: notification.created_at,
        }
    }
}
