// src/services/dashboard_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        club::{Club, Event, Update},
        enrollment::{EnrollmentStatus, EnrollmentWithClub, EnrollmentWithStudent},
        notification::Notification,
        outcome::OpResult,
        user::{Identity, Role},
    },
    services::{club_service, enrollment_service, guard, notification_service},
};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role")]
pub enum Dashboard {
    Student {
        clubs: Vec<Club>,
        events: Vec<Event>,
        updates: Vec<Update>,
        notifications: Vec<Notification>,
        memberships: Vec<EnrollmentWithClub>,
        applications: Vec<EnrollmentWithClub>,
    },
    Coordinator {
        club: Club,
        applicants: Vec<EnrollmentWithStudent>,
    },
    Admin {
        clubs: Vec<Club>,
    },
}

pub async fn dashboard(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
) -> AppResult<OpResult<Dashboard>> {
    let me = guard::require_identity(identity)?;
    tracing::debug!("Building {} dashboard for user {}", me.role, me.user_id);

    match me.role {
        Role::Student => student_dashboard(db_pool, me.user_id).await,
        Role::Coordinator => coordinator_dashboard(db_pool, me.user_id).await,
        Role::Admin => {
            let clubs = club_service::find_all_clubs(db_pool).await?;
            Ok(OpResult::success("Admin dashboard", Dashboard::Admin { clubs }))
        }
    }
}

async fn student_dashboard(
    db_pool: &SqlitePool,
    student_id: i64,
) -> AppResult<OpResult<Dashboard>> {
    let clubs = club_service::find_all_clubs(db_pool).await?;
    let events = club_service::find_all_events(db_pool).await?;
    let updates = club_service::find_all_updates(db_pool).await?;
    let notifications = notification_service::find_for_user(db_pool, student_id).await?;

    let (memberships, applications): (Vec<_>, Vec<_>) = enrollment_service::find_for_student(db_pool, student_id)
        .await?
        .into_iter()
        .partition(|e| e.status == EnrollmentStatus::Member);

    Ok(OpResult::success(
        "Student dashboard",
        Dashboard::Student {
            clubs,
            events,
            updates,
            notifications,
            memberships,
            applications,
        },
    ))
}

async fn coordinator_dashboard(
    db_pool: &SqlitePool,
    coord_id: i64,
) -> AppResult<OpResult<Dashboard>> {
    let Some(link) = guard::find_coordinator_link(db_pool, coord_id).await? else {
        tracing::warn!("Coordinator {} has no club link", coord_id);
        return Ok(OpResult::failure(
            "Coordinator account not linked to a club. Please contact the Admin.",
        ));
    };

    let club = club_service::find_club(db_pool, link.club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;
    let applicants =
        enrollment_service::find_by_status(db_pool, club.club_id, EnrollmentStatus::Applicant)
            .await?;

    Ok(OpResult::success(
        format!("{} applicants pending.", applicants.len()),
        Dashboard::Coordinator { club, applicants },
    ))
}
