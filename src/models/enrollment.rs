// src/models/enrollment.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::club::Club;

/// Membership state of a (student, club) pair. No row at all means "None".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum EnrollmentStatus {
    Applicant,
    Member,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Applicant => "Applicant",
            EnrollmentStatus::Member => "Member",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Enrollment {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub club_id: i64,
    pub status: EnrollmentStatus,
}

/// Enrollment joined with the student's username, for applicant and member lists.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct EnrollmentWithStudent {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub username: String,
    pub club_id: i64,
    pub status: EnrollmentStatus,
}

/// Enrollment joined with the club's name, for the student's own dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct EnrollmentWithClub {
    pub enrollment_id: i64,
    pub club_id: i64,
    pub club_name: String,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantAction {
    Enroll,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct ApplicantActionForm {
    pub action: ApplicantAction,
}

/// Student-facing club page: the club, where the student stands, and who is in it.
#[derive(Debug, Clone, Serialize)]
pub struct ClubDetail {
    pub club: Club,
    pub enrollment_status: Option<EnrollmentStatus>,
    pub members: Vec<EnrollmentWithStudent>,
}

/// A club with one slice of its enrollments (applicants or members).
#[derive(Debug, Clone, Serialize)]
pub struct ClubRoster {
    pub club: Club,
    pub enrollments: Vec<EnrollmentWithStudent>,
}
