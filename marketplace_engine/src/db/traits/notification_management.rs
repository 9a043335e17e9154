use std::future::Future;

use crate::db_types::{NewNotification, Notification, NotificationId, UserId};

/// Storage for user notifications.
///
/// Unlike the other backend traits, the futures returned here must be `Send`: notifications are written from
/// event-handler tasks that are spawned onto the tokio runtime.
pub trait NotificationManagement: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> impl Future<Output = Result<Notification, Self::Error>> + Send;

    fn fetch_notification(
        &self,
        id: NotificationId,
    ) -> impl Future<Output = Result<Option<Notification>, Self::Error>> + Send;

    /// The user's notifications, newest first.
    fn fetch_notifications_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send;

    fn count_unread_notifications(&self, user_id: UserId) -> impl Future<Output = Result<i64, Self::Error>> + Send;

    /// Returns `false` if there is no such notification.
    fn mark_notification_read(&self, id: NotificationId) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Returns the number of notifications that changed.
    fn mark_all_notifications_read(&self, user_id: UserId)
        -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Returns `false` if there is no such notification.
    fn delete_notification(&self, id: NotificationId) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
