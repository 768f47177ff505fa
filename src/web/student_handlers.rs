// src/web/student_handlers.rs
use crate::{
    error::AppResult,
    models::{
        enrollment::{ClubDetail, EnrollmentStatus},
        outcome::OpResult,
        registration::{EventRegistration, RegistrationForm, RegistrationFormView},
        user::Identity,
    },
    services::{enrollment_service, registration_service},
    state::AppState,
    web::extract::AppForm,
};
use axum::{
    extract::{Extension, Path, State},
    Json,
};

// GET /club/{id}
pub async fn club_detail_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
) -> AppResult<Json<OpResult<ClubDetail>>> {
    tracing::debug!("GET /club/{} by user {}", club_id, identity.user_id);
    let record = enrollment_service::club_detail(&state.db_pool, Some(&identity), club_id).await?;
    Ok(Json(record))
}

// POST /club/{id}/join
pub async fn join_club_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
) -> AppResult<Json<OpResult<EnrollmentStatus>>> {
    let record = enrollment_service::join_club(&state.db_pool, Some(&identity), club_id).await?;
    Ok(Json(record))
}

// GET /register/event/form/{id}
pub async fn registration_form_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<i64>,
) -> AppResult<Json<OpResult<RegistrationFormView>>> {
    let record =
        registration_service::registration_form(&state.db_pool, Some(&identity), event_id).await?;
    Ok(Json(record))
}

// POST /register/event/submit/{id}
pub async fn register_event_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<i64>,
    AppForm(form): AppForm<RegistrationForm>,
) -> AppResult<Json<OpResult<EventRegistration>>> {
    tracing::info!("User {} registering for event {}", identity.user_id, event_id);
    let record =
        registration_service::register_for_event(&state.db_pool, Some(&identity), event_id, &form)
            .await?;
    Ok(Json(record))
}
