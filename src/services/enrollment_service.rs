// src/services/enrollment_service.rs
//! Membership lifecycle: a student joins as Applicant, the club's coordinator
//! approves (Member) or rejects (row removed), and may later dismiss a Member.
//! Rejection and dismissal notify the student; approval does not.
use crate::{
    error::{AppError, AppResult},
    models::{
        club::Club,
        enrollment::{
            ApplicantAction, ClubDetail, ClubRoster, Enrollment, EnrollmentStatus,
            EnrollmentWithClub, EnrollmentWithStudent,
        },
        outcome::{settle, OpResult},
        user::{Identity, Role},
    },
    services::{club_service, guard, notification_service, user_service},
};
use sqlx::SqlitePool;

pub async fn find_enrollment(
    db_pool: &SqlitePool,
    enrollment_id: i64,
) -> AppResult<Option<Enrollment>> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        "SELECT enrollment_id, student_id, club_id, status FROM enrollments WHERE enrollment_id = ?1",
    )
    .bind(enrollment_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(enrollment)
}

pub async fn find_status(
    db_pool: &SqlitePool,
    student_id: i64,
    club_id: i64,
) -> AppResult<Option<EnrollmentStatus>> {
    let status = sqlx::query_scalar::<_, EnrollmentStatus>(
        "SELECT status FROM enrollments WHERE student_id = ?1 AND club_id = ?2",
    )
    .bind(student_id)
    .bind(club_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(status)
}

/// Enrollments of one club in one state, joined with the students' usernames.
pub async fn find_by_status(
    db_pool: &SqlitePool,
    club_id: i64,
    status: EnrollmentStatus,
) -> AppResult<Vec<EnrollmentWithStudent>> {
    let rows = sqlx::query_as::<_, EnrollmentWithStudent>(
        r#"
        SELECT e.enrollment_id, e.student_id, u.username, e.club_id, e.status
        FROM enrollments e
        JOIN users u ON u.user_id = e.student_id
        WHERE e.club_id = ?1 AND e.status = ?2
        ORDER BY u.username ASC
        "#,
    )
    .bind(club_id)
    .bind(status)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

pub async fn find_for_student(
    db_pool: &SqlitePool,
    student_id: i64,
) -> AppResult<Vec<EnrollmentWithClub>> {
    let rows = sqlx::query_as::<_, EnrollmentWithClub>(
        r#"
        SELECT e.enrollment_id, e.club_id, c.name AS club_name, e.status
        FROM enrollments e
        JOIN clubs c ON c.club_id = e.club_id
        WHERE e.student_id = ?1
        ORDER BY c.name ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// Student view of a club, with their own status and the member list.
pub async fn club_detail(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
) -> AppResult<OpResult<ClubDetail>> {
    let student = guard::require_role(identity, Role::Student)?;
    let club = club_service::find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;

    let enrollment_status = find_status(db_pool, student.user_id, club_id).await?;
    let members = find_by_status(db_pool, club_id, EnrollmentStatus::Member).await?;

    Ok(OpResult::success(
        club.name.clone(),
        ClubDetail {
            club,
            enrollment_status,
            members,
        },
    ))
}

fn already_enrolled(status: EnrollmentStatus) -> OpResult<EnrollmentStatus> {
    let message = match status {
        EnrollmentStatus::Applicant => "You have already applied to this club.",
        EnrollmentStatus::Member => "You are already a member of this club.",
    };
    OpResult::failure_with(message, status)
}

/// Creates an Applicant row for the calling student. Never duplicates.
pub async fn join_club(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
) -> AppResult<OpResult<EnrollmentStatus>> {
    let student = guard::require_role(identity, Role::Student)?;
    let club = club_service::find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;

    settle(
        insert_applicant(db_pool, student.user_id, &club).await,
        "An error occurred",
    )
}

async fn insert_applicant(
    db_pool: &SqlitePool,
    student_id: i64,
    club: &Club,
) -> AppResult<OpResult<EnrollmentStatus>> {
    if let Some(status) = find_status(db_pool, student_id, club.club_id).await? {
        tracing::warn!(
            "Join refused: student {} is already {} of '{}'",
            student_id,
            status.as_str(),
            club.name
        );
        return Ok(already_enrolled(status));
    }

    let inserted = sqlx::query(
        "INSERT INTO enrollments (student_id, club_id, status) VALUES (?1, ?2, ?3)",
    )
    .bind(student_id)
    .bind(club.club_id)
    .bind(EnrollmentStatus::Applicant)
    .execute(db_pool)
    .await;

    match inserted {
        Ok(_) => {
            tracing::info!("✅ Student {} applied to '{}'", student_id, club.name);
            Ok(OpResult::success(
                "Application sent successfully! Status: Applicant.",
                EnrollmentStatus::Applicant,
            ))
        }
        // A concurrent join won the race; report it like any other duplicate
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let status = find_status(db_pool, student_id, club.club_id)
                .await?
                .unwrap_or(EnrollmentStatus::Applicant);
            Ok(already_enrolled(status))
        }
        Err(e) => Err(e.into()),
    }
}

/// Loads the enrollment, its club and student name, and checks that the
/// caller coordinates that club.
async fn load_for_coordinator(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    enrollment_id: i64,
) -> AppResult<(Enrollment, Club, String)> {
    guard::require_role(identity, Role::Coordinator)?;
    let enrollment = find_enrollment(db_pool, enrollment_id)
        .await?
        .ok_or(AppError::NotFound("Enrollment"))?;
    let club = club_service::find_club(db_pool, enrollment.club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;

    guard::require_club_coordinator(db_pool, identity, club.club_id).await?;

    let username = user_service::find_user_by_id(db_pool, enrollment.student_id)
        .await?
        .map(|u| u.username)
        .ok_or(AppError::NotFound("User"))?;

    Ok((enrollment, club, username))
}

/// Applicant → Member. Sends no notification.
pub async fn approve_applicant(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    enrollment_id: i64,
) -> AppResult<OpResult<()>> {
    let (enrollment, club, username) =
        load_for_coordinator(db_pool, identity, enrollment_id).await?;

    settle(
        promote(db_pool, &enrollment, &club, &username).await,
        "Error processing action",
    )
}

async fn promote(
    db_pool: &SqlitePool,
    enrollment: &Enrollment,
    club: &Club,
    username: &str,
) -> AppResult<OpResult<()>> {
    let rows_affected = sqlx::query(
        "UPDATE enrollments SET status = ?1 WHERE enrollment_id = ?2 AND status = ?3",
    )
    .bind(EnrollmentStatus::Member)
    .bind(enrollment.enrollment_id)
    .bind(EnrollmentStatus::Applicant)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "Student {} is not an applicant of {}.",
            username, club.name
        )));
    }

    tracing::info!("✅ Student '{}' enrolled in '{}'", username, club.name);
    Ok(OpResult::success(
        format!("Student {} successfully enrolled in {}!", username, club.name),
        (),
    ))
}

/// Removes an Applicant row and tells the student, in one transaction.
pub async fn reject_applicant(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    enrollment_id: i64,
) -> AppResult<OpResult<()>> {
    let (enrollment, club, username) =
        load_for_coordinator(db_pool, identity, enrollment_id).await?;

    settle(
        remove_with_notice(
            db_pool,
            &enrollment,
            Some(EnrollmentStatus::Applicant),
            &format!("Your application to join the {} has been rejected.", club.name),
        )
        .await
        .map(|_| {
            tracing::info!("Application of '{}' to '{}' rejected", username, club.name);
            OpResult::success(
                format!("Student {}'s application to {} was rejected.", username, club.name),
                (),
            )
        })
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Student {} is not an applicant of {}.",
                username, club.name
            )),
            other => other,
        }),
        "Error processing action",
    )
}

/// Notifies the student and deletes the enrollment in one transaction. With
/// `expected` set, the delete only matches a row still in that state.
async fn remove_with_notice(
    db_pool: &SqlitePool,
    enrollment: &Enrollment,
    expected: Option<EnrollmentStatus>,
    notice: &str,
) -> AppResult<()> {
    let mut tx = db_pool.begin().await?;

    notification_service::push(&mut *tx, enrollment.student_id, notice).await?;

    let rows_affected = match expected {
        Some(status) => {
            sqlx::query("DELETE FROM enrollments WHERE enrollment_id = ?1 AND status = ?2")
                .bind(enrollment.enrollment_id)
                .bind(status)
                .execute(&mut *tx)
                .await?
        }
        None => {
            sqlx::query("DELETE FROM enrollments WHERE enrollment_id = ?1")
                .bind(enrollment.enrollment_id)
                .execute(&mut *tx)
                .await?
        }
    }
    .rows_affected();

    if rows_affected == 0 {
        // Dropping tx rolls the notification back
        return Err(AppError::Conflict("Enrollment changed state.".into()));
    }

    tx.commit().await?;
    Ok(())
}

/// The coordinator's single "update applicant" entry point.
pub async fn update_applicant(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    enrollment_id: i64,
    action: ApplicantAction,
) -> AppResult<OpResult<()>> {
    match action {
        ApplicantAction::Enroll => approve_applicant(db_pool, identity, enrollment_id).await,
        ApplicantAction::Reject => reject_applicant(db_pool, identity, enrollment_id).await,
    }
}

/// Removes a membership and tells the student, in one transaction.
pub async fn dismiss_member(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    enrollment_id: i64,
) -> AppResult<OpResult<()>> {
    let (enrollment, club, username) =
        load_for_coordinator(db_pool, identity, enrollment_id).await?;

    let notice = format!(
        "Your membership in the {} has been dismissed by the coordinator.",
        club.name
    );
    let result = remove_with_notice(db_pool, &enrollment, None, &notice)
        .await
        .map(|_| {
            tracing::info!("Member '{}' dismissed from '{}'", username, club.name);
            OpResult::success(
                format!("Member {} successfully dismissed from {}.", username, club.name),
                (),
            )
        });

    settle(result, "Error dismissing member")
}

async fn roster(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
    status: EnrollmentStatus,
) -> AppResult<OpResult<ClubRoster>> {
    guard::require_role(identity, Role::Coordinator)?;
    let club = club_service::find_club(db_pool, club_id)
        .await?
        .ok_or(AppError::NotFound("Club"))?;
    guard::require_club_coordinator(db_pool, identity, club_id).await?;

    let enrollments = find_by_status(db_pool, club_id, status).await?;
    tracing::debug!(
        "Club '{}' has {} rows with status {}",
        club.name,
        enrollments.len(),
        status.as_str()
    );
    Ok(OpResult::success(
        format!("{} {}s.", enrollments.len(), status.as_str().to_lowercase()),
        ClubRoster { club, enrollments },
    ))
}

pub async fn list_applicants(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
) -> AppResult<OpResult<ClubRoster>> {
    roster(db_pool, identity, club_id, EnrollmentStatus::Applicant).await
}

pub async fn list_members(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
) -> AppResult<OpResult<ClubRoster>> {
    roster(db_pool, identity, club_id, EnrollmentStatus::Member).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        services::{notification_service::find_for_user, seed_service, seed_service::Seeded},
    };

    struct Actors {
        pool: SqlitePool,
        seed: Seeded,
        coord: Identity,
        student: Identity,
    }

    async fn setup() -> Actors {
        let pool = db::create_db_pool("sqlite::memory:").await.unwrap();
        let seed = seed_service::seed(&pool, 4).await.unwrap();
        let coord = Identity { user_id: seed.coordinator_id, role: Role::Coordinator };
        // student2 has no enrollment in the seeded club
        let student = Identity { user_id: seed.student_ids[1], role: Role::Student };
        Actors { pool, seed, coord, student }
    }

    async fn enrollment_count(pool: &SqlitePool, student_id: i64, club_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE student_id = ?1 AND club_id = ?2")
            .bind(student_id)
            .bind(club_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn enrollment_id_of(pool: &SqlitePool, student_id: i64, club_id: i64) -> i64 {
        sqlx::query_scalar("SELECT enrollment_id FROM enrollments WHERE student_id = ?1 AND club_id = ?2")
            .bind(student_id)
            .bind(club_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn second_join_is_refused_and_leaves_row_unchanged() {
        let a = setup().await;

        let first = join_club(&a.pool, Some(&a.student), a.seed.club_id).await.unwrap();
        assert!(first.success);
        assert_eq!(first.data, Some(EnrollmentStatus::Applicant));

        let second = join_club(&a.pool, Some(&a.student), a.seed.club_id).await.unwrap();
        assert!(!second.success);
        assert_eq!(second.data, Some(EnrollmentStatus::Applicant));
        assert_eq!(second.message, "You have already applied to this club.");

        assert_eq!(enrollment_count(&a.pool, a.student.user_id, a.seed.club_id).await, 1);
        assert_eq!(
            find_status(&a.pool, a.student.user_id, a.seed.club_id).await.unwrap(),
            Some(EnrollmentStatus::Applicant)
        );
    }

    #[tokio::test]
    async fn join_reports_membership() {
        let a = setup().await;
        join_club(&a.pool, Some(&a.student), a.seed.club_id).await.unwrap();
        let id = enrollment_id_of(&a.pool, a.student.user_id, a.seed.club_id).await;
        approve_applicant(&a.pool, Some(&a.coord), id).await.unwrap();

        let again = join_club(&a.pool, Some(&a.student), a.seed.club_id).await.unwrap();
        assert!(!again.success);
        assert_eq!(again.data, Some(EnrollmentStatus::Member));
    }

    #[tokio::test]
    async fn join_requires_student_and_existing_club() {
        let a = setup().await;
        assert!(matches!(
            join_club(&a.pool, Some(&a.coord), a.seed.club_id).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            join_club(&a.pool, None, a.seed.club_id).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            join_club(&a.pool, Some(&a.student), 4242).await,
            Err(AppError::NotFound("Club"))
        ));
    }

    #[tokio::test]
    async fn approve_promotes_without_notification() {
        let a = setup().await;
        let applicant = a.seed.student_ids[0];

        let record = approve_applicant(&a.pool, Some(&a.coord), a.seed.enrollment_id).await.unwrap();
        assert!(record.success, "{}", record.message);
        assert_eq!(record.message, "Student student1 successfully enrolled in Tech Innovators Club!");

        assert_eq!(
            find_status(&a.pool, applicant, a.seed.club_id).await.unwrap(),
            Some(EnrollmentStatus::Member)
        );
        assert!(find_for_user(&a.pool, applicant).await.unwrap().is_empty());

        // Approve is not repeatable, and a Member cannot be rejected
        let again = approve_applicant(&a.pool, Some(&a.coord), a.seed.enrollment_id).await.unwrap();
        assert!(!again.success);
        let reject = reject_applicant(&a.pool, Some(&a.coord), a.seed.enrollment_id).await.unwrap();
        assert!(!reject.success);
        assert!(find_for_user(&a.pool, applicant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reject_deletes_row_and_notifies_once() {
        let a = setup().await;
        let applicant = a.seed.student_ids[0];

        let record = update_applicant(
            &a.pool,
            Some(&a.coord),
            a.seed.enrollment_id,
            ApplicantAction::Reject,
        )
        .await
        .unwrap();
        assert!(record.success);

        assert_eq!(enrollment_count(&a.pool, applicant, a.seed.club_id).await, 0);
        let notes = find_for_user(&a.pool, applicant).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(
            notes[0].message,
            "Your application to join the Tech Innovators Club has been rejected."
        );
        assert!(!notes[0].is_read);

        // The row is gone, so approving it now is NotFound
        assert!(matches!(
            approve_applicant(&a.pool, Some(&a.coord), a.seed.enrollment_id).await,
            Err(AppError::NotFound("Enrollment"))
        ));
    }

    #[tokio::test]
    async fn only_the_owning_coordinator_may_act() {
        let a = setup().await;
        let admin = Identity { user_id: a.seed.admin_id, role: Role::Admin };

        // A second club with its own coordinator
        let other = club_service::create_club(
            &a.pool,
            Some(&admin),
            &crate::models::club::NewClubForm {
                club_name: "Chess Society".into(),
                summary: "Chess".into(),
                description: "Weekly games".into(),
                faculty_advisor: "Dr. K".into(),
                coord_username: "chesscoord".into(),
                coord_password: "pw".into(),
            },
            4,
        )
        .await
        .unwrap();
        assert!(other.success, "{}", other.message);
        let other_coord = user_service::find_user_by_username(&a.pool, "chesscoord")
            .await
            .unwrap()
            .unwrap();
        let other_coord = Identity { user_id: other_coord.user_id, role: Role::Coordinator };

        assert!(matches!(
            approve_applicant(&a.pool, Some(&other_coord), a.seed.enrollment_id).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            dismiss_member(&a.pool, Some(&other_coord), a.seed.enrollment_id).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            list_applicants(&a.pool, Some(&other_coord), a.seed.club_id).await,
            Err(AppError::Unauthorized)
        ));
        assert_eq!(
            find_status(&a.pool, a.seed.student_ids[0], a.seed.club_id).await.unwrap(),
            Some(EnrollmentStatus::Applicant)
        );
    }

    #[tokio::test]
    async fn rosters_split_applicants_and_members() {
        let a = setup().await;
        join_club(&a.pool, Some(&a.student), a.seed.club_id).await.unwrap();
        approve_applicant(&a.pool, Some(&a.coord), a.seed.enrollment_id).await.unwrap();

        let applicants = list_applicants(&a.pool, Some(&a.coord), a.seed.club_id)
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(applicants.enrollments.len(), 1);
        assert_eq!(applicants.enrollments[0].username, "student2");

        let members = list_members(&a.pool, Some(&a.coord), a.seed.club_id)
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(members.enrollments.len(), 1);
        assert_eq!(members.enrollments[0].username, "student1");

        let detail = club_detail(&a.pool, Some(&a.student), a.seed.club_id)
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(detail.enrollment_status, Some(EnrollmentStatus::Applicant));
        assert_eq!(detail.members.len(), 1);
    }

    #[tokio::test]
    async fn students_are_denied_even_for_missing_ids() {
        let a = setup().await;
        for id in [a.seed.enrollment_id, 999] {
            assert!(matches!(
                update_applicant(&a.pool, Some(&a.student), id, ApplicantAction::Enroll).await,
                Err(AppError::Unauthorized)
            ));
            assert!(matches!(
                dismiss_member(&a.pool, Some(&a.student), id).await,
                Err(AppError::Unauthorized)
            ));
        }
        for club_id in [a.seed.club_id, 999] {
            assert!(matches!(
                list_applicants(&a.pool, Some(&a.student), club_id).await,
                Err(AppError::Unauthorized)
            ));
            assert!(matches!(
                list_members(&a.pool, Some(&a.student), club_id).await,
                Err(AppError::Unauthorized)
            ));
        }
        // The coordinator still learns that the id does not exist
        assert!(matches!(
            list_applicants(&a.pool, Some(&a.coord), 999).await,
            Err(AppError::NotFound("Club"))
        ));
    }
}
