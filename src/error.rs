// src/error.rs
use crate::models::outcome::OpResult;
use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] envconfig::Error),

    #[error("Failed to process password")]
    PasswordHashingError,

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Session error: {0}")]
    SessionError(String),

    /// The referenced row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness or state precondition failed. The message is user facing.
    #[error("{0}")]
    Conflict(String),

    /// Missing or malformed input. The message is user facing.
    #[error("{0}")]
    Invalid(String),

    #[error("Unexpected internal error")]
    InternalServerError,

    #[error("Access denied")]
    Unauthorized,
}

impl AppError {
    /// Turns a unique-constraint failure into `Conflict`, passing anything else through.
    pub fn on_unique_violation(err: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(message())
            }
            _ => AppError::SqlxError(err),
        }
    }

    /// NotFound and Unauthorized abort the request instead of producing an error record.
    pub fn aborts_request(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::Unauthorized)
    }

    /// Message shown to the caller when an operation fails after its checks passed.
    pub fn surface(&self, context: &str) -> String {
        match self {
            AppError::Conflict(msg) | AppError::Invalid(msg) => msg.clone(),
            other => format!("{}: {}", context, other),
        }
    }
}

// A malformed form body is answered like any other invalid input
impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::Invalid(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Unauthorized => {
                tracing::warn!("Request denied, redirecting to landing page");
                return Redirect::to("/").into_response();
            }
            AppError::NotFound(entity) => {
                tracing::warn!("{} not found, redirecting to dashboard", entity);
                let error_msg = urlencoding::encode(&self.to_string()).into_owned();
                return Redirect::to(&format!("/dashboard?error={}", error_msg)).into_response();
            }
            _ => tracing::error!("Request failed: {:?}", self),
        }

        let (status, user_message) = match &self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error accessing data.".to_string(),
            ),
            AppError::SessionError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error managing your session.".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred.".to_string(),
            ),
        };

        (status, Json(OpResult::<()>::failure(user_message))).into_response()
    }
}

pub type AppResult<T = ()> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_keeps_user_facing_messages_verbatim() {
        let err = AppError::Conflict("Club name 'Chess' already exists.".into());
        assert_eq!(err.surface("ignored"), "Club name 'Chess' already exists.");
    }

    #[test]
    fn surface_appends_cause_for_store_failures() {
        let err = AppError::SqlxError(sqlx::Error::RowNotFound);
        assert!(err.surface("An error occurred").starts_with("An error occurred: Database error"));
    }

    #[test]
    fn redirects_on_denial() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/");
    }

    #[test]
    fn not_found_redirects_to_dashboard() {
        let response = AppError::NotFound("Club").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/dashboard?error=Club%20not%20found"
        );
    }
}
