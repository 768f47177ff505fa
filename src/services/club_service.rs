// src/services/club_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        club::{
            Club, ClubEditForm, ClubEvents, Event, NewClubForm, NewEventForm, NewUpdateForm,
            Update, EVENT_DATE_FORMAT,
        },
        outcome::{settle, OpResult},
        user::{Identity, Role},
    },
    services::{auth_service, guard, user_service},
};
use chrono::{Local, NaiveDateTime};
use sqlx::SqlitePool;

const CLUB_COLUMNS: &str =
    "club_id, name, summary, description, faculty_advisor, photo_url, past_events_summary";

pub async fn find_club(db_pool: &SqlitePool, club_id: i64) -> AppResult<Option<Club>> {
    tracing::debug!("Fetching club {}", club_id);
    let club = sqlx::query_as::<_, Club>(&format!(
        "SELECT {} FROM clubs WHERE club_id = ?1",
        CLUB_COLUMNS
    ))
    .bind(club_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(club)
}

pub async fn find_all_clubs(db_pool: &SqlitePool) -> AppResult<Vec<Club>> {
    let clubs = sqlx::query_as::<_, Club>(&format!(
        "SELECT {} FROM clubs ORDER BY name ASC",
        CLUB_COLUMNS
    ))
    .fetch_all(db_pool)
    .await?;
    Ok(clubs)
}

pub async fn find_event(db_pool: &SqlitePool, event_id: i64) -> AppResult<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(
        r#"
        SELECT event_id, club_id, title, date_time, location, description, registration_link
        FROM events
        WHERE event_id = ?1
        "#,
    )
    .bind(event_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(event)
}

/// Every event of every club, latest first.
pub async fn find_all_events(db_pool: &SqlitePool) -> AppResult<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT e.event_id, e.club_id, e.title, e.date_time, e.location, e.description,
               e.registration_link
        FROM events e
        JOIN clubs c ON c.club_id = e.club_id
        ORDER BY e.date_time DESC
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    Ok(events)
}

pub async fn find_all_updates(db_pool: &SqlitePool) -> AppResult<Vec<Update>> {
    let updates = sqlx::query_as::<_, Update>(
        r#"
        SELECT u.update_id, u.club_id, u.message, u.timestamp
        FROM updates u
        JOIN clubs c ON c.club_id = u.club_id
        ORDER BY u.timestamp DESC, u.update_id DESC
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    Ok(updates)
}

// --- Club lifecycle (admin) ---

/// Creates the coordinator account, the club and the link between them, or nothing.
pub async fn create_club(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    form: &NewClubForm,
    bcrypt_cost: u32,
) -> AppResult<OpResult<Club>> {
    guard::require_role(identity, Role::Admin)?;
    tracing::info!(
        "Creating club '{}' with coordinator '{}'",
        form.club_name,
        form.coord_username
    );

    settle(
        insert_club_with_coordinator(db_pool, form, bcrypt_cost).await,
        "An unexpected error occurred",
    )
}

async fn insert_club_with_coordinator(
    db_pool: &SqlitePool,
    form: &NewClubForm,
    bcrypt_cost: u32,
) -> AppResult<OpResult<Club>> {
    let club_name = form.club_name.trim();
    let coord_username = form.coord_username.trim();
    if club_name.is_empty() || coord_username.is_empty() || form.coord_password.is_empty() {
        return Err(AppError::Invalid(
            "Club name, coordinator username and password are required.".into(),
        ));
    }

    // Hash before the transaction so the write lock is not held during bcrypt
    let password_hash = auth_service::hash_password(&form.coord_password, bcrypt_cost).await?;

    let mut tx = db_pool.begin().await?;

    let coord_id = user_service::insert_user_row(
        &mut *tx,
        coord_username,
        &password_hash,
        Role::Coordinator,
        || format!("Coordinator username '{}' already exists.", coord_username),
    )
    .await?;

    let name_taken: Option<i64> = sqlx::query_scalar("SELECT club_id FROM clubs WHERE name = ?1")
        .bind(club_name)
        .fetch_optional(&mut *tx)
        .await?;
    if name_taken.is_some() {
        return Err(AppError::Conflict(format!("Club name '{}' already exists.", club_name)));
    }

    let club_id = sqlx::query(
        r#"
        INSERT INTO clubs (name, summary, description, faculty_advisor, past_events_summary)
        VALUES (?1, ?2, ?3, ?4, 'No past events recorded yet.')
        "#,
    )
    .bind(club_name)
    .bind(&form.summary)
    .bind(&form.description)
    .bind(&form.faculty_advisor)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        AppError::on_unique_violation(e, || format!("Club name '{}' already exists.", club_name))
    })?
    .last_insert_rowid();

    sqlx::query("INSERT INTO coordinators (coord_id, club_id) VALUES (?1, ?2)")
        .bind(coord_id)
        .bind(club_id)
        .execute(&mut *tx)
        .await?;

    let club = sqlx::query_as::<_, Club>(&format!(
        "SELECT {} FROM clubs WHERE club_id = ?1",
        CLUB_COLUMNS
    ))
    .bind(club_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!("✅ Club '{}' created (id {}).", club_name, club_id);
    Ok(OpResult::success(
        format!(
            "Success! Club '{}' created and Coordinator '{}' assigned.",
            club_name, coord_username
        ),
        club,
    ))
}

/// Removes a club and everything hanging off it.
pub async fn delete_club(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
) -> AppResult<OpResult<()>> {
    guard::require_role(identity, Role::Admin)?;
    let club = find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;

    settle(
        cascade_delete_club(db_pool, &club).await,
        &format!("Error deleting club {}", club.name),
    )
}

async fn cascade_delete_club(db_pool: &SqlitePool, club: &Club) -> AppResult<OpResult<()>> {
    let club_id = club.club_id;
    let mut tx = db_pool.begin().await?;

    // Registrations point at events, so they go first
    let registrations = sqlx::query(
        "DELETE FROM event_registrations WHERE event_id IN (SELECT event_id FROM events WHERE club_id = ?1)",
    )
    .bind(club_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let mut removed = Vec::with_capacity(4);
    for table in ["events", "updates", "enrollments", "coordinators"] {
        let rows = sqlx::query(&format!("DELETE FROM {} WHERE club_id = ?1", table))
            .bind(club_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        removed.push(format!("{} {}", rows, table));
    }

    sqlx::query("DELETE FROM clubs WHERE club_id = ?1")
        .bind(club_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(
        "✅ Club '{}' deleted ({} registrations, {}).",
        club.name,
        registrations,
        removed.join(", ")
    );
    Ok(OpResult::success(
        format!(
            "Success! Club '{}' and all associated data have been permanently deleted.",
            club.name
        ),
        (),
    ))
}

async fn apply_club_edit(
    db_pool: &SqlitePool,
    club_id: i64,
    form: &ClubEditForm,
) -> AppResult<Club> {
    sqlx::query(
        r#"
        UPDATE clubs
        SET summary = ?1,
            description = ?2,
            faculty_advisor = ?3,
            past_events_summary = ?4,
            photo_url = ?5
        WHERE club_id = ?6
        "#,
    )
    .bind(&form.summary)
    .bind(&form.description)
    .bind(&form.faculty_advisor)
    .bind(&form.past_events_summary)
    .bind(&form.photo_url)
    .bind(club_id)
    .execute(db_pool)
    .await?;

    find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))
}

pub async fn edit_club_as_admin(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
    form: &ClubEditForm,
) -> AppResult<OpResult<Club>> {
    guard::require_role(identity, Role::Admin)?;
    find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;

    let result = apply_club_edit(db_pool, club_id, form)
        .await
        .map(|club| OpResult::success("Club details updated successfully by Admin!", club));
    settle(result, "Error updating club details")
}

pub async fn edit_club_as_coordinator(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
    form: &ClubEditForm,
) -> AppResult<OpResult<Club>> {
    guard::require_role(identity, Role::Coordinator)?;
    find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;
    guard::require_club_coordinator(db_pool, identity, club_id).await?;

    let result = apply_club_edit(db_pool, club_id, form)
        .await
        .map(|club| OpResult::success("Club details updated successfully!", club));
    settle(result, "Error updating club details")
}

// --- Club content (coordinator) ---

pub async fn list_club_events(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
) -> AppResult<OpResult<ClubEvents>> {
    guard::require_role(identity, Role::Coordinator)?;
    let club = find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;
    guard::require_club_coordinator(db_pool, identity, club_id).await?;

    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT event_id, club_id, title, date_time, location, description, registration_link
        FROM events
        WHERE club_id = ?1
        ORDER BY date_time ASC
        "#,
    )
    .bind(club_id)
    .fetch_all(db_pool)
    .await?;

    Ok(OpResult::success(
        format!("{} events.", events.len()),
        ClubEvents { club, events },
    ))
}

pub fn parse_event_date(raw: &str) -> AppResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), EVENT_DATE_FORMAT).map_err(|_| {
        AppError::Invalid("Error: Invalid Date/Time format. Use YYYY-MM-DD HH:MM.".into())
    })
}

pub async fn add_event(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
    form: &NewEventForm,
) -> AppResult<OpResult<Event>> {
    guard::require_role(identity, Role::Coordinator)?;
    find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;
    guard::require_club_coordinator(db_pool, identity, club_id).await?;

    settle(insert_event(db_pool, club_id, form).await, "An error occurred")
}

async fn insert_event(
    db_pool: &SqlitePool,
    club_id: i64,
    form: &NewEventForm,
) -> AppResult<OpResult<Event>> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(AppError::Invalid("Event title is required.".into()));
    }
    let date_time = parse_event_date(&form.date_time)?;
    let registration_link = form
        .registration_link
        .as_deref()
        .map(str::trim)
        .filter(|link| !link.is_empty());

    let event_id = sqlx::query(
        r#"
        INSERT INTO events (club_id, title, date_time, location, description, registration_link)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(club_id)
    .bind(title)
    .bind(date_time)
    .bind(&form.location)
    .bind(&form.description)
    .bind(registration_link)
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    let event = find_event(db_pool, event_id)
        .await?
        .ok_or(AppError::InternalServerError)?;
    tracing::info!("✅ Event '{}' created for club {}", title, club_id);
    Ok(OpResult::success(
        format!("Event '{}' created successfully!", title),
        event,
    ))
}

pub async fn post_update(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
    form: &NewUpdateForm,
) -> AppResult<OpResult<Update>> {
    guard::require_role(identity, Role::Coordinator)?;
    find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;
    guard::require_club_coordinator(db_pool, identity, club_id).await?;

    settle(insert_update(db_pool, club_id, form).await, "Error posting update")
}

async fn insert_update(
    db_pool: &SqlitePool,
    club_id: i64,
    form: &NewUpdateForm,
) -> AppResult<OpResult<Update>> {
    if form.message.trim().is_empty() {
        return Err(AppError::Invalid("Update message cannot be empty.".into()));
    }

    let update = sqlx::query_as::<_, Update>(
        r#"
        INSERT INTO updates (club_id, message, timestamp)
        VALUES (?1, ?2, ?3)
        RETURNING update_id, club_id, message, timestamp
        "#,
    )
    .bind(club_id)
    .bind(&form.message)
    .bind(Local::now().naive_local())
    .fetch_one(db_pool)
    .await?;

    tracing::info!("✅ Update {} posted for club {}", update.update_id, club_id);
    Ok(OpResult::success(
        "Update successfully posted to the Student Dashboard!",
        update,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        models::registration::RegistrationForm,
        services::{enrollment_service, registration_service, seed_service, seed_service::Seeded},
    };

    async fn setup() -> (SqlitePool, Seeded, Identity, Identity) {
        let pool = db::create_db_pool("sqlite::memory:").await.unwrap();
        let seed = seed_service::seed(&pool, 4).await.unwrap();
        let admin = Identity { user_id: seed.admin_id, role: Role::Admin };
        let coord = Identity { user_id: seed.coordinator_id, role: Role::Coordinator };
        (pool, seed, admin, coord)
    }

    async fn count(pool: &SqlitePool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
    }

    fn club_form(name: &str, coord: &str) -> NewClubForm {
        NewClubForm {
            club_name: name.into(),
            summary: "Summary".into(),
            description: "Description".into(),
            faculty_advisor: "Dr. B".into(),
            coord_username: coord.into(),
            coord_password: "pw".into(),
        }
    }

    #[tokio::test]
    async fn create_club_binds_new_coordinator() {
        let (pool, _, admin, _) = setup().await;
        let record = create_club(&pool, Some(&admin), &club_form("Drama", "dramacoord"), 4)
            .await
            .unwrap();
        assert!(record.success, "{}", record.message);
        let club = record.data.unwrap();
        assert_eq!(club.past_events_summary.as_deref(), Some("No past events recorded yet."));

        let coord = user_service::find_user_by_username(&pool, "dramacoord")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(coord.role, Role::Coordinator);
        let link = guard::find_coordinator_link(&pool, coord.user_id).await.unwrap().unwrap();
        assert_eq!(link.club_id, club.club_id);
    }

    #[tokio::test]
    async fn taken_coordinator_username_writes_nothing() {
        let (pool, _, admin, _) = setup().await;
        let users = count(&pool, "SELECT COUNT(*) FROM users").await;
        let clubs = count(&pool, "SELECT COUNT(*) FROM clubs").await;
        let links = count(&pool, "SELECT COUNT(*) FROM coordinators").await;

        let record = create_club(&pool, Some(&admin), &club_form("Drama", "student5"), 4)
            .await
            .unwrap();
        assert!(!record.success);
        assert_eq!(record.message, "Coordinator username 'student5' already exists.");

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM users").await, users);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM clubs").await, clubs);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM coordinators").await, links);
    }

    #[tokio::test]
    async fn taken_club_name_rolls_back_the_new_user() {
        let (pool, _, admin, _) = setup().await;
        let record = create_club(
            &pool,
            Some(&admin),
            &club_form("Tech Innovators Club", "freshcoord"),
            4,
        )
        .await
        .unwrap();
        assert!(!record.success);
        assert_eq!(record.message, "Club name 'Tech Innovators Club' already exists.");
        assert!(user_service::find_user_by_username(&pool, "freshcoord")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_club_leaves_no_references() {
        let (pool, seed, admin, coord) = setup().await;
        let student = Identity { user_id: seed.student_ids[1], role: Role::Student };

        // Add a second event, an update, a member and a registration
        add_event(
            &pool,
            Some(&coord),
            seed.club_id,
            &NewEventForm {
                title: "Hack Night".into(),
                date_time: "2025-12-01 18:30".into(),
                location: "Lab 3".into(),
                description: "Bring a laptop".into(),
                registration_link: None,
            },
        )
        .await
        .unwrap();
        post_update(&pool, Some(&coord), seed.club_id, &NewUpdateForm { message: "Hi".into() })
            .await
            .unwrap();
        enrollment_service::join_club(&pool, Some(&student), seed.club_id).await.unwrap();
        registration_service::register_for_event(
            &pool,
            Some(&student),
            seed.event_id,
            &RegistrationForm { roll_number: Some("R9".into()), ..Default::default() },
        )
        .await
        .unwrap();

        let record = delete_club(&pool, Some(&admin), seed.club_id).await.unwrap();
        assert!(record.success, "{}", record.message);
        assert_eq!(
            record.message,
            "Success! Club 'Tech Innovators Club' and all associated data have been permanently deleted."
        );

        for table in ["events", "updates", "enrollments", "coordinators", "clubs"] {
            let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE club_id = ?1", table))
                .bind(seed.club_id)
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(n, 0, "{} still references the club", table);
        }
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM event_registrations").await, 0);
        // The coordinator account itself survives
        assert!(user_service::find_user_by_id(&pool, seed.coordinator_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_unknown_club_is_not_found() {
        let (pool, _, admin, _) = setup().await;
        assert!(matches!(
            delete_club(&pool, Some(&admin), 777).await,
            Err(AppError::NotFound("Club"))
        ));
    }

    #[tokio::test]
    async fn edits_are_identical_but_separately_guarded() {
        let (pool, seed, admin, coord) = setup().await;
        let form = ClubEditForm {
            summary: "New summary".into(),
            description: Some("New description".into()),
            faculty_advisor: None,
            past_events_summary: Some("Hackathon 2024".into()),
            photo_url: Some("/static/img/new.jpg".into()),
        };

        let by_coord = edit_club_as_coordinator(&pool, Some(&coord), seed.club_id, &form)
            .await
            .unwrap();
        assert_eq!(by_coord.message, "Club details updated successfully!");
        let by_admin = edit_club_as_admin(&pool, Some(&admin), seed.club_id, &form)
            .await
            .unwrap();
        assert_eq!(by_admin.message, "Club details updated successfully by Admin!");
        assert_eq!(by_coord.data, by_admin.data);

        let club = by_admin.data.unwrap();
        assert_eq!(club.summary, "New summary");
        assert_eq!(club.faculty_advisor, None);

        assert!(matches!(
            edit_club_as_admin(&pool, Some(&coord), seed.club_id, &form).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            edit_club_as_coordinator(&pool, Some(&admin), seed.club_id, &form).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn bad_event_date_is_reported() {
        let (pool, seed, _, coord) = setup().await;
        let record = add_event(
            &pool,
            Some(&coord),
            seed.club_id,
            &NewEventForm {
                title: "Oops".into(),
                date_time: "15/11/2025".into(),
                location: "".into(),
                description: "".into(),
                registration_link: None,
            },
        )
        .await
        .unwrap();
        assert!(!record.success);
        assert_eq!(record.message, "Error: Invalid Date/Time format. Use YYYY-MM-DD HH:MM.");
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM events").await, 1);
    }

    #[tokio::test]
    async fn club_events_are_listed_in_date_order() {
        let (pool, seed, _, coord) = setup().await;
        add_event(
            &pool,
            Some(&coord),
            seed.club_id,
            &NewEventForm {
                title: "Kickoff".into(),
                date_time: "2025-09-01 09:00".into(),
                location: "Hall".into(),
                description: "".into(),
                registration_link: Some("  ".into()),
            },
        )
        .await
        .unwrap();

        let listed = list_club_events(&pool, Some(&coord), seed.club_id)
            .await
            .unwrap()
            .data
            .unwrap();
        let titles: Vec<_> = listed.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Kickoff", "Annual Coding Competition"]);
        assert_eq!(listed.events[0].registration_link, None);
    }

    #[tokio::test]
    async fn failed_club_delete_keeps_every_row() {
        let (pool, seed, admin, _) = setup().await;
        let student = Identity { user_id: seed.student_ids[1], role: Role::Student };
        registration_service::register_for_event(
            &pool,
            Some(&student),
            seed.event_id,
            &RegistrationForm { roll_number: Some("R2".into()), ..Default::default() },
        )
        .await
        .unwrap();

        // Fails the last statement, after every child table was already cleared
        sqlx::query(
            "CREATE TRIGGER block_club_delete BEFORE DELETE ON clubs BEGIN SELECT RAISE(ABORT, 'club delete blocked'); END;",
        )
        .execute(&pool)
        .await
        .unwrap();

        let record = delete_club(&pool, Some(&admin), seed.club_id).await.unwrap();
        assert!(!record.success);
        assert!(
            record.message.starts_with("Error deleting club Tech Innovators Club"),
            "{}",
            record.message
        );

        for table in ["events", "updates", "enrollments", "coordinators", "clubs"] {
            let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE club_id = ?1", table))
                .bind(seed.club_id)
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(n, 1, "{} lost rows", table);
        }
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM event_registrations").await, 1);
    }

    #[tokio::test]
    async fn role_is_checked_before_the_club_is_looked_up() {
        let (pool, seed, admin, _) = setup().await;
        let student = Identity { user_id: seed.student_ids[0], role: Role::Student };
        let form = ClubEditForm {
            summary: "x".into(),
            description: None,
            faculty_advisor: None,
            past_events_summary: None,
            photo_url: None,
        };

        // Existing and missing ids must be indistinguishable to a non-coordinator
        for who in [&student, &admin] {
            for club_id in [seed.club_id, 999] {
                assert!(matches!(
                    list_club_events(&pool, Some(who), club_id).await,
                    Err(AppError::Unauthorized)
                ));
                assert!(matches!(
                    edit_club_as_coordinator(&pool, Some(who), club_id, &form).await,
                    Err(AppError::Unauthorized)
                ));
                assert!(matches!(
                    post_update(&pool, Some(who), club_id, &NewUpdateForm { message: "x".into() }).await,
                    Err(AppError::Unauthorized)
                ));
            }
        }
        assert!(matches!(
            list_club_events(&pool, None, 999).await,
            Err(AppError::Unauthorized)
        ));
    }
}
