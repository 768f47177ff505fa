// src/models/registration.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{club::Event, user::UserSummary};

/// Registration row. The contact fields are copies taken at submit time.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct EventRegistration {
    pub registration_id: i64,
    pub event_id: i64,
    pub student_id: i64,
    pub registration_date: NaiveDateTime,
    pub student_roll_number: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub student_year: Option<String>,
    pub student_major: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RegistrationWithStudent {
    pub registration_id: i64,
    pub student_id: i64,
    pub username: String,
    pub registration_date: NaiveDateTime,
    pub student_roll_number: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub student_year: Option<String>,
    pub student_major: Option<String>,
}

// Roll number is optional here so that a missing one fails inside the transaction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    pub roll_number: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub student_year: Option<String>,
    pub student_major: Option<String>,
}

/// What the registration form needs before submit.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationFormView {
    pub event: Event,
    pub current_user: UserSummary,
    pub already_registered: bool,
}
