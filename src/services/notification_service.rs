// src/services/notification_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{notification::Notification, outcome::OpResult, user::Identity},
    services::guard,
};
use chrono::Local;
use sqlx::{SqliteConnection, SqlitePool};

/// Appends a notification inside the caller's transaction.
pub(crate) async fn push(
    conn: &mut SqliteConnection,
    user_id: i64,
    message: &str,
) -> AppResult<i64> {
    tracing::debug!("Notifying user {}: {}", user_id, message);
    let id = sqlx::query(
        "INSERT INTO notifications (user_id, message, timestamp, is_read) VALUES (?1, ?2, ?3, 0)",
    )
    .bind(user_id)
    .bind(message)
    .bind(Local::now().naive_local())
    .execute(conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn find_for_user(db_pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT notification_id, user_id, message, timestamp, is_read
        FROM notifications
        WHERE user_id = ?1
        ORDER BY timestamp DESC, notification_id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;
    Ok(notifications)
}

/// The caller's own notifications, newest first.
pub async fn list_notifications(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
) -> AppResult<OpResult<Vec<Notification>>> {
    let me = guard::require_identity(identity)?;
    let notifications = find_for_user(db_pool, me.user_id).await?;
    let unread = notifications.iter().filter(|n| !n.is_read).count();
    Ok(OpResult::success(format!("{} unread.", unread), notifications))
}

pub async fn mark_read(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    notification_id: i64,
) -> AppResult<OpResult<()>> {
    let me = guard::require_identity(identity)?;

    // Someone else's notification looks exactly like a missing one
    let rows_affected = sqlx::query(
        "UPDATE notifications SET is_read = 1 WHERE notification_id = ?1 AND user_id = ?2",
    )
    .bind(notification_id)
    .bind(me.user_id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::NotFound("Notification"));
    }
    Ok(OpResult::success("Notification marked as read.", ()))
}
