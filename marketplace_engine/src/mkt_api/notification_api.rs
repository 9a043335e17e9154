use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::NotificationManagement,
    db_types::{NewNotification, Notification, NotificationId, NotificationType, UserId},
    mkt_api::errors::NotificationApiError,
};

/// A user's notification inbox.
pub struct NotificationApi<B> {
    db: B,
}

impl<B> Debug for NotificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B> NotificationApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> NotificationApi<B>
where B: NotificationManagement
{
    pub async fn create_notification(
        &self,
        user_id: UserId,
        title: &str,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<Notification, NotificationApiError> {
        let notification = NewNotification::new(user_id, title, message, notification_type);
        self.send(notification).await
    }

    /// Stores a fully specified notification, such as one linked to an order.
    pub async fn send(&self, notification: NewNotification) -> Result<Notification, NotificationApiError> {
        let notification = self.db.insert_notification(notification).await.map_err(NotificationApiError::database)?;
        debug!("🔔️ Notification {} created for {}", notification.id, notification.user_id);
        Ok(notification)
    }

    /// All of the user's notifications, newest first.
    pub async fn notifications_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, NotificationApiError> {
        self.db.fetch_notifications_for_user(user_id, false).await.map_err(NotificationApiError::database)
    }

    pub async fn unread_notifications(&self, user_id: UserId) -> Result<Vec<Notification>, NotificationApiError> {
        self.db.fetch_notifications_for_user(user_id, true).await.map_err(NotificationApiError::database)
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, NotificationApiError> {
        self.db.count_unread_notifications(user_id).await.map_err(NotificationApiError::database)
    }

    /// Marks one of the user's notifications as read.
    pub async fn mark_as_read(&self, id: NotificationId, user_id: UserId) -> Result<Notification, NotificationApiError> {
        let notification = self.fetch_owned(id, user_id).await?;
        if notification.is_read {
            return Ok(notification);
        }
        self.db.mark_notification_read(id).await.map_err(NotificationApiError::database)?;
        trace!("🔔️ Notification {id} read by {user_id}");
        Ok(Notification { is_read: true, ..notification })
    }

    /// Returns the number of notifications that were unread.
    pub async fn mark_all_as_read(&self, user_id: UserId) -> Result<u64, NotificationApiError> {
        let count = self.db.mark_all_notifications_read(user_id).await.map_err(NotificationApiError::database)?;
        debug!("🔔️ {count} notifications marked as read for {user_id}");
        Ok(count)
    }

    pub async fn delete_notification(&self, id: NotificationId, user_id: UserId) -> Result<(), NotificationApiError> {
        self.fetch_owned(id, user_id).await?;
        if !self.db.delete_notification(id).await.map_err(NotificationApiError::database)? {
            return Err(NotificationApiError::NotFoundError(format!("{id}")));
        }
        debug!("🔔️ Notification {id} deleted by {user_id}");
        Ok(())
    }

    async fn fetch_owned(&self, id: NotificationId, user_id: UserId) -> Result<Notification, NotificationApiError> {
        let notification = self
            .db
            .fetch_notification(id)
            .await
            .map_err(NotificationApiError::database)?
            .ok_or_else(|| NotificationApiError::NotFoundError(format!("{id}")))?;
        if notification.user_id != user_id {
            return Err(NotificationApiError::AuthorizationError(format!("{id} does not belong to {user_id}")));
        }
        Ok(notification)
    }
}
