// src/web/coordinator_handlers.rs
// Every route here is checked against the caller's own club by the services.
use crate::{
    error::AppResult,
    models::{
        club::{Club, ClubEditForm, ClubEvents, Event, NewEventForm, NewUpdateForm, Update},
        enrollment::{ApplicantActionForm, ClubRoster},
        outcome::OpResult,
        registration::RegistrationWithStudent,
        user::Identity,
    },
    services::{club_service, enrollment_service, registration_service},
    state::AppState,
    web::extract::AppForm,
};
use axum::{
    extract::{Extension, Path, State},
    Json,
};

// POST /coord/edit_club/{id}
pub async fn edit_club_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
    AppForm(form): AppForm<ClubEditForm>,
) -> AppResult<Json<OpResult<Club>>> {
    let record =
        club_service::edit_club_as_coordinator(&state.db_pool, Some(&identity), club_id, &form)
            .await?;
    Ok(Json(record))
}

// GET /coord/manage_events/{id}
pub async fn manage_events_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
) -> AppResult<Json<OpResult<ClubEvents>>> {
    let record = club_service::list_club_events(&state.db_pool, Some(&identity), club_id).await?;
    Ok(Json(record))
}

// POST /coord/add_event/{id}
pub async fn add_event_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
    AppForm(form): AppForm<NewEventForm>,
) -> AppResult<Json<OpResult<Event>>> {
    tracing::info!("Coordinator {} adding event '{}'", identity.user_id, form.title);
    let record = club_service::add_event(&state.db_pool, Some(&identity), club_id, &form).await?;
    Ok(Json(record))
}

// POST /coord/post_update/{id}
pub async fn post_update_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
    AppForm(form): AppForm<NewUpdateForm>,
) -> AppResult<Json<OpResult<Update>>> {
    let record = club_service::post_update(&state.db_pool, Some(&identity), club_id, &form).await?;
    Ok(Json(record))
}

// GET /coord/manage_members/{id}
pub async fn manage_members_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
) -> AppResult<Json<OpResult<ClubRoster>>> {
    let record = enrollment_service::list_members(&state.db_pool, Some(&identity), club_id).await?;
    Ok(Json(record))
}

// POST /coord/dismiss_member/{enrollment_id}
pub async fn dismiss_member_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(enrollment_id): Path<i64>,
) -> AppResult<Json<OpResult<()>>> {
    let record =
        enrollment_service::dismiss_member(&state.db_pool, Some(&identity), enrollment_id).await?;
    Ok(Json(record))
}

// GET /coord/applicants/{id}
pub async fn applicants_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
) -> AppResult<Json<OpResult<ClubRoster>>> {
    let record =
        enrollment_service::list_applicants(&state.db_pool, Some(&identity), club_id).await?;
    Ok(Json(record))
}

// POST /coord/update_applicant/{enrollment_id}
pub async fn update_applicant_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(enrollment_id): Path<i64>,
    AppForm(form): AppForm<ApplicantActionForm>,
) -> AppResult<Json<OpResult<()>>> {
    tracing::info!(
        "Coordinator {} applying {:?} to enrollment {}",
        identity.user_id,
        form.action,
        enrollment_id
    );
    let record = enrollment_service::update_applicant(
        &state.db_pool,
        Some(&identity),
        enrollment_id,
        form.action,
    )
    .await?;
    Ok(Json(record))
}

// GET /coord/view_registrations/{event_id}
pub async fn view_registrations_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<i64>,
) -> AppResult<Json<OpResult<Vec<RegistrationWithStudent>>>> {
    let record =
        registration_service::view_registrations(&state.db_pool, Some(&identity), event_id)
            .await?;
    Ok(Json(record))
}
