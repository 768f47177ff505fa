// src/web/admin_handlers.rs
use crate::{
    error::AppResult,
    models::{
        club::{Club, ClubEditForm, NewClubForm},
        outcome::OpResult,
        user::{Identity, NewUserForm, UserSummary},
    },
    services::{club_service, user_service},
    state::AppState,
    web::extract::AppForm,
};
use axum::{
    extract::{Extension, Path, State},
    Json,
};

// POST /admin/add_club
pub async fn add_club_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppForm(form): AppForm<NewClubForm>,
) -> AppResult<Json<OpResult<Club>>> {
    tracing::debug!("POST /admin/add_club: '{}'", form.club_name);
    let record = club_service::create_club(
        &state.db_pool,
        Some(&identity),
        &form,
        state.config.bcrypt_cost,
    )
    .await?;
    Ok(Json(record))
}

// POST /admin/edit_club/{id}
pub async fn edit_club_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
    AppForm(form): AppForm<ClubEditForm>,
) -> AppResult<Json<OpResult<Club>>> {
    let record =
        club_service::edit_club_as_admin(&state.db_pool, Some(&identity), club_id, &form).await?;
    Ok(Json(record))
}

// POST /admin/delete_club/{id}
pub async fn delete_club_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(club_id): Path<i64>,
) -> AppResult<Json<OpResult<()>>> {
    tracing::info!("Admin {} deleting club {}", identity.user_id, club_id);
    let record = club_service::delete_club(&state.db_pool, Some(&identity), club_id).await?;
    Ok(Json(record))
}

// GET /admin/manage_users
pub async fn manage_users_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Json<OpResult<Vec<UserSummary>>>> {
    let record = user_service::list_manageable_users(&state.db_pool, Some(&identity)).await?;
    Ok(Json(record))
}

// POST /admin/add_user
pub async fn add_user_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppForm(form): AppForm<NewUserForm>,
) -> AppResult<Json<OpResult<UserSummary>>> {
    let record = user_service::create_user(
        &state.db_pool,
        Some(&identity),
        &form,
        state.config.bcrypt_cost,
    )
    .await?;
    Ok(Json(record))
}

// POST /admin/delete_user/{id}
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<OpResult<()>>> {
    tracing::info!("Admin {} deleting user {}", identity.user_id, user_id);
    let record = user_service::delete_user(&state.db_pool, Some(&identity), user_id).await?;
    Ok(Json(record))
}
