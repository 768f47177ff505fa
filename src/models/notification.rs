// src/models/notification.rs
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Notification {
    pub notification_id: i64,
    pub user_id: i64,
    pub message: String,
    pub timestamp: NaiveDateTime,
    pub is_read: bool,
}
