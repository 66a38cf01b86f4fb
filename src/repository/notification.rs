use diesel::prelude::*;

use crate::domain::notification::{NewNotification, Notification};
use crate::domain::types::{EmailAddress, NotificationId};
use crate::models::notification::{
    NewNotification as DbNewNotification, Notification as DbNotification,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, NotificationReader, NotificationWriter};

impl NotificationReader for DieselRepository {
    fn list_notifications(
        &self,
        user_email: &EmailAddress,
        unread_only: bool,
    ) -> RepositoryResult<Vec<Notification>> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;
        let mut query = notifications::table
            .filter(notifications::user_email.eq(user_email.as_str()))
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
        }

        query
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .load::<DbNotification>(&mut conn)?
            .into_iter()
            .map(|notification| Notification::try_from(notification).map_err(RepositoryError::from))
            .collect()
    }
}

impl NotificationWriter for DieselRepository {
    fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> RepositoryResult<Notification> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;
        let stored = diesel::insert_into(notifications::table)
            .values(DbNewNotification::from(notification))
            .get_result::<DbNotification>(&mut conn)?;

        Ok(Notification::try_from(stored)?)
    }

    fn mark_notification_read(
        &self,
        id: NotificationId,
        user_email: &EmailAddress,
    ) -> RepositoryResult<bool> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;
        let updated = diesel::update(
            notifications::table
                .find(id.get())
                .filter(notifications::user_email.eq(user_email.as_str())),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;

        Ok(updated > 0)
    }

    fn mark_all_notifications_read(&self, user_email: &EmailAddress) -> RepositoryResult<usize> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_email.eq(user_email.as_str()))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;

        Ok(updated)
    }
}
