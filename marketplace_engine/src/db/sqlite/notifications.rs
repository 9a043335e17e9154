use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewNotification, Notification, NotificationId, UserId},
};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, notification_type, is_read, order_id, product_name, quantity, created_at";

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, SqliteDatabaseError> {
    let sql = format!(
        r#"
            INSERT INTO notifications (user_id, title, message, notification_type, order_id, product_name, quantity,
                created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {NOTIFICATION_COLUMNS};
        "#
    );
    let notification = sqlx::query_as::<_, Notification>(&sql)
        .bind(notification.user_id)
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.notification_type)
        .bind(notification.order_id)
        .bind(notification.product_name)
        .bind(notification.quantity)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Notification {} saved for {}", notification.id, notification.user_id);
    Ok(notification)
}

pub async fn fetch_notification(
    id: NotificationId,
    conn: &mut SqliteConnection,
) -> Result<Option<Notification>, SqliteDatabaseError> {
    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1");
    let notification = sqlx::query_as::<_, Notification>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(notification)
}

/// Newest first. Notifications created in the same instant are ordered by id, also descending.
pub async fn fetch_for_user(
    user_id: UserId,
    unread_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, SqliteDatabaseError> {
    let filter = if unread_only { "AND is_read = 0" } else { "" };
    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 {filter} ORDER BY created_at DESC, id DESC"
    );
    let notifications = sqlx::query_as::<_, Notification>(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(notifications)
}

pub async fn count_unread(user_id: UserId, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = 0")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn mark_read(id: NotificationId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(user_id: UserId, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = $1 AND is_read = 0")
        .bind(user_id)
        .execute(conn)
        .await?;
    trace!("🗃️ {} notifications marked as read for {user_id}", result.rows_affected());
    Ok(result.rows_affected())
}

pub async fn delete(id: NotificationId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
