// src/services/seed_service.rs
//! Bulk initialization: wipes every table and loads the demo campus.
use crate::{
    error::AppResult,
    models::{enrollment::EnrollmentStatus, user::Role},
    services::auth_service,
};
use chrono::{Local, NaiveDate};
use sqlx::{SqliteConnection, SqlitePool};

pub const DEFAULT_PASSWORD: &str = "123";
pub const STUDENT_COUNT: usize = 53;

/// Ids of the seeded rows. `student_ids[0]` is `student1`.
#[derive(Debug, Clone)]
pub struct Seeded {
    pub admin_id: i64,
    pub coordinator_id: i64,
    pub club_id: i64,
    pub event_id: i64,
    pub update_id: i64,
    pub enrollment_id: i64,
    pub student_ids: Vec<i64>,
}

// Children before parents so foreign keys never dangle mid-wipe
const TABLES: [&str; 8] = [
    "event_registrations",
    "notifications",
    "enrollments",
    "updates",
    "events",
    "coordinators",
    "clubs",
    "users",
];

pub async fn seed(db_pool: &SqlitePool, bcrypt_cost: u32) -> AppResult<Seeded> {
    // Everyone shares one password, so one hash serves all accounts
    let password_hash = auth_service::hash_password(DEFAULT_PASSWORD, bcrypt_cost).await?;

    let mut tx = db_pool.begin().await?;

    for table in TABLES {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM sqlite_sequence")
        .execute(&mut *tx)
        .await?;

    let seeded = insert_demo_rows(&mut *tx, &password_hash).await?;

    tx.commit().await?;
    tracing::info!(
        "✅ Database initialized with {} user accounts.",
        seeded.student_ids.len() + 2
    );
    Ok(seeded)
}

async fn insert_user(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
    role: Role,
) -> AppResult<i64> {
    let id = sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)")
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .execute(conn)
        .await?
        .last_insert_rowid();
    Ok(id)
}

async fn insert_demo_rows(conn: &mut SqliteConnection, password_hash: &str) -> AppResult<Seeded> {
    let admin_id = insert_user(conn, "admin", password_hash, Role::Admin).await?;
    let coordinator_id = insert_user(conn, "coord", password_hash, Role::Coordinator).await?;

    let mut student_ids = Vec::with_capacity(STUDENT_COUNT);
    for i in 1..=STUDENT_COUNT {
        let username = format!("student{}", i);
        student_ids.push(insert_user(conn, &username, password_hash, Role::Student).await?);
    }

    let club_id = sqlx::query(
        r#"
        INSERT INTO clubs (name, summary, description, faculty_advisor, past_events_summary, photo_url)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind("Tech Innovators Club")
    .bind("Focuses on app development, AI, and hackathons.")
    .bind("A club for students passionate about technology and innovation. We meet weekly for coding sessions and guest lectures.")
    .bind("Dr. A. Sharma")
    .bind("Successfully hosted the Annual Hackathon in March.")
    .bind("/static/img/tech_club_default.jpg")
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    sqlx::query("INSERT INTO coordinators (coord_id, club_id) VALUES (?1, ?2)")
        .bind(coordinator_id)
        .bind(club_id)
        .execute(&mut *conn)
        .await?;

    let competition_start = NaiveDate::from_ymd_opt(2025, 11, 15).and_then(|d| d.and_hms_opt(10, 0, 0));
    let event_id = sqlx::query(
        r#"
        INSERT INTO events (club_id, title, date_time, location, description, registration_link)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(club_id)
    .bind("Annual Coding Competition")
    .bind(competition_start)
    .bind("Auditorium")
    .bind("Solve challenges and win prizes!")
    .bind("/register/codecomp")
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    let update_id = sqlx::query("INSERT INTO updates (club_id, message, timestamp) VALUES (?1, ?2, ?3)")
        .bind(club_id)
        .bind("New meeting schedule posted. Check the club page.")
        .bind(Local::now().naive_local())
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    let enrollment_id =
        sqlx::query("INSERT INTO enrollments (student_id, club_id, status) VALUES (?1, ?2, ?3)")
            .bind(student_ids[0])
            .bind(club_id)
            .bind(EnrollmentStatus::Applicant)
            .execute(&mut *conn)
            .await?
            .last_insert_rowid();

    Ok(Seeded {
        admin_id,
        coordinator_id,
        club_id,
        event_id,
        update_id,
        enrollment_id,
        student_ids,
    })
}
