// src/services/registration_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        club::Event,
        outcome::{settle, OpResult},
        registration::{
            EventRegistration, RegistrationForm, RegistrationFormView, RegistrationWithStudent,
        },
        user::{Identity, Role, UserSummary},
    },
    services::{club_service, guard, notification_service, user_service},
};
use chrono::Local;
use sqlx::SqlitePool;

pub async fn find_registration(
    db_pool: &SqlitePool,
    event_id: i64,
    student_id: i64,
) -> AppResult<Option<EventRegistration>> {
    let registration = sqlx::query_as::<_, EventRegistration>(
        r#"
        SELECT registration_id, event_id, student_id, registration_date, student_roll_number,
               contact_email, contact_phone, student_year, student_major
        FROM event_registrations
        WHERE event_id = ?1 AND student_id = ?2
        "#,
    )
    .bind(event_id)
    .bind(student_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(registration)
}

async fn require_event(db_pool: &SqlitePool, event_id: i64) -> AppResult<Event> {
    club_service::find_event(db_pool, event_id)
        .await?
        .ok_or(AppError::NotFound("Event"))
}

/// Everything the student needs to fill in the registration form.
pub async fn registration_form(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    event_id: i64,
) -> AppResult<OpResult<RegistrationFormView>> {
    let student = guard::require_role(identity, Role::Student)?;
    let event = require_event(db_pool, event_id).await?;
    let current_user: UserSummary = user_service::find_user_by_id(db_pool, student.user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?
        .into();

    let already_registered = find_registration(db_pool, event_id, student.user_id)
        .await?
        .is_some();
    let message = if already_registered {
        "You are already registered for this event.".to_string()
    } else {
        event.title.clone()
    };

    Ok(OpResult::success(
        message,
        RegistrationFormView {
            event,
            current_user,
            already_registered,
        },
    ))
}

/// Stores the registration and its confirmation notification together.
pub async fn register_for_event(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    event_id: i64,
    form: &RegistrationForm,
) -> AppResult<OpResult<EventRegistration>> {
    let student = guard::require_role(identity, Role::Student)?;
    let event = require_event(db_pool, event_id).await?;

    if find_registration(db_pool, event_id, student.user_id)
        .await?
        .is_some()
    {
        tracing::warn!(
            "Student {} tried to register twice for event {}",
            student.user_id,
            event_id
        );
        return Ok(OpResult::failure("You were already registered."));
    }

    settle(
        insert_registration(db_pool, student.user_id, &event, form).await,
        "An error occurred",
    )
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn insert_registration(
    db_pool: &SqlitePool,
    student_id: i64,
    event: &Event,
    form: &RegistrationForm,
) -> AppResult<OpResult<EventRegistration>> {
    let mut tx = db_pool.begin().await?;

    // A blank roll number binds NULL and trips the NOT NULL constraint
    let roll_number = blank_to_none(&form.roll_number);

    let inserted = sqlx::query_as::<_, EventRegistration>(
        r#"
        INSERT INTO event_registrations (
            event_id, student_id, registration_date, student_roll_number,
            contact_email, contact_phone, student_year, student_major
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING registration_id, event_id, student_id, registration_date, student_roll_number,
                  contact_email, contact_phone, student_year, student_major
        "#,
    )
    .bind(event.event_id)
    .bind(student_id)
    .bind(Local::now().naive_local())
    .bind(roll_number)
    .bind(blank_to_none(&form.contact_email))
    .bind(blank_to_none(&form.contact_phone))
    .bind(blank_to_none(&form.student_year))
    .bind(blank_to_none(&form.student_major))
    .fetch_one(&mut *tx)
    .await;

    let registration = match inserted {
        Ok(registration) => registration,
        // Lost a race against a concurrent submit for the same pair
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Ok(OpResult::failure("You were already registered."));
        }
        Err(e) => return Err(e.into()),
    };

    notification_service::push(
        &mut *tx,
        student_id,
        &format!("You successfully registered for the '{}' event.", event.title),
    )
    .await?;

    tx.commit().await?;
    tracing::info!(
        "✅ Student {} registered for event '{}'",
        student_id,
        event.title
    );
    Ok(OpResult::success(
        "Registration successful! See you there!",
        registration,
    ))
}

/// Registrations for one event, visible to the coordinator of its club.
pub async fn view_registrations(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    event_id: i64,
) -> AppResult<OpResult<Vec<RegistrationWithStudent>>> {
    guard::require_role(identity, Role::Coordinator)?;
    let event = require_event(db_pool, event_id).await?;
    guard::require_club_coordinator(db_pool, identity, event.club_id).await?;

    let registrations = sqlx::query_as::<_, RegistrationWithStudent>(
        r#"
        SELECT r.registration_id, r.student_id, u.username, r.registration_date,
               r.student_roll_number, r.contact_email, r.contact_phone,
               r.student_year, r.student_major
        FROM event_registrations r
        JOIN users u ON u.user_id = r.student_id
        WHERE r.event_id = ?1
        ORDER BY r.registration_date ASC, r.registration_id ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(db_pool)
    .await?;

    tracing::debug!(
        "Event {} has {} registrations",
        event_id,
        registrations.len()
    );
    Ok(OpResult::success(
        format!("Registrations for '{}'", event.title),
        registrations,
    ))
}
