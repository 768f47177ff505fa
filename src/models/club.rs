// src/models/club.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Club {
    pub club_id: i64,
    pub name: String,
    pub summary: String,
    pub description: Option<String>,
    pub faculty_advisor: Option<String>,
    pub photo_url: Option<String>,
    pub past_events_summary: Option<String>,
}

/// Admin form that creates a club together with its coordinator account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClubForm {
    pub club_name: String,
    pub summary: String,
    pub description: String,
    pub faculty_advisor: String,
    pub coord_username: String,
    pub coord_password: String,
}

/// Overwrites every editable club field. Shared by the admin and coordinator edits.
#[derive(Debug, Clone, Deserialize)]
pub struct ClubEditForm {
    pub summary: String,
    pub description: Option<String>,
    pub faculty_advisor: Option<String>,
    pub past_events_summary: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Event {
    pub event_id: i64,
    pub club_id: i64,
    pub title: String,
    pub date_time: NaiveDateTime,
    pub location: Option<String>,
    pub description: Option<String>,
    pub registration_link: Option<String>,
}

/// `date_time` arrives as `YYYY-MM-DD HH:MM`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEventForm {
    pub title: String,
    pub date_time: String,
    pub location: String,
    pub description: String,
    pub registration_link: Option<String>,
}

pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

// Club announcement. Never edited after posting.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Update {
    pub update_id: i64,
    pub club_id: i64,
    pub message: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUpdateForm {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CoordinatorLink {
    pub coord_id: i64,
    pub club_id: i64,
}

/// Coordinator event-management view.
#[derive(Debug, Clone, Serialize)]
pub struct ClubEvents {
    pub club: Club,
    pub events: Vec<Event>,
}
