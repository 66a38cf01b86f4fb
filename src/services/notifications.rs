use chrono::Utc;

use crate::domain::notification::{NewNotification, Notification};
use crate::domain::types::{EmailAddress, NotificationId, NotificationMessage, NotificationTitle};
use crate::repository::{NotificationReader, NotificationWriter};
use crate::services::{ServiceError, ServiceResult};

fn parse_email(raw: &str) -> ServiceResult<EmailAddress> {
    EmailAddress::new(raw).map_err(|_| ServiceError::Form("Invalid email address".to_string()))
}

/// Stores a notification for the given user.
pub fn notify<R>(
    repo: &R,
    user_email: &EmailAddress,
    title: &str,
    message: &str,
    link: Option<String>,
) -> ServiceResult<Notification>
where
    R: NotificationWriter + ?Sized,
{
    let notification = NewNotification {
        user_email: user_email.clone(),
        title: NotificationTitle::new(title)?,
        message: NotificationMessage::new(message)?,
        link,
        created_at: Utc::now().naive_utc(),
    };

    let stored = repo.create_notification(&notification).map_err(|err| {
        log::error!("Failed to store notification for {user_email}: {err}");
        err
    })?;

    Ok(stored)
}

pub fn list_notifications<R>(
    repo: &R,
    user_email: &str,
    unread_only: bool,
) -> ServiceResult<Vec<Notification>>
where
    R: NotificationReader + ?Sized,
{
    let email = parse_email(user_email)?;
    Ok(repo.list_notifications(&email, unread_only)?)
}

/// Marks one notification as read. Notifications of other users are reported as missing.
pub fn mark_read<R>(repo: &R, notification_id: i32, user_email: &str) -> ServiceResult<()>
where
    R: NotificationWriter + ?Sized,
{
    let email = parse_email(user_email)?;
    let id = NotificationId::new(notification_id).map_err(|_| ServiceError::NotFound)?;

    if repo.mark_notification_read(id, &email)? {
        Ok(())
    } else {
        Err(ServiceError::NotFound)
    }
}

pub fn mark_all_read<R>(repo: &R, user_email: &str) -> ServiceResult<usize>
where
    R: NotificationWriter + ?Sized,
{
    let email = parse_email(user_email)?;
    Ok(repo.mark_all_notifications_read(&email)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;

    #[test]
    fn notify_sanitizes_text() {
        let mut repo = MockRepository::new();
        repo.expect_create_notification()
            .withf(|n| n.title.as_str() == "Clicked" && n.message.as_str() == "bob clicked")
            .returning(|n| {
                Ok(Notification {
                    id: NotificationId::new(1).expect("id"),
                    user_email: n.user_email.clone(),
                    title: n.title.clone(),
                    message: n.message.clone(),
                    link: n.link.clone(),
                    is_read: false,
                    created_at: n.created_at,
                })
            });
        let owner = EmailAddress::new("owner@example.com").expect("email");

        let stored = notify(
            &repo,
            &owner,
            "  Clicked ",
            "bob clicked<script>x()</script>",
            None,
        )
        .expect("notification");

        assert!(!stored.is_read);
    }

    #[test]
    fn notify_rejects_blank_title() {
        let repo = MockRepository::new();
        let owner = EmailAddress::new("owner@example.com").expect("email");
        assert!(matches!(
            notify(&repo, &owner, "  ", "body", None),
            Err(ServiceError::TypeConstraint(_))
        ));
    }

    #[test]
    fn mark_read_of_foreign_notification_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_mark_notification_read().returning(|_, _| Ok(false));

        assert!(matches!(
            mark_read(&repo, 4, "someone@example.com"),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn invalid_email_is_a_form_error() {
        let repo = MockRepository::new();
        assert!(matches!(
            list_notifications(&repo, "nobody", false),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn mark_all_read_returns_count() {
        let mut repo = MockRepository::new();
        repo.expect_mark_all_notifications_read()
            .withf(|email| email.as_str() == "owner@example.com")
            .returning(|_| Ok(3));

        assert_eq!(mark_all_read(&repo, "Owner@Example.com").expect("count"), 3);
    }
}
