// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{outcome::OpResult, user::LoginForm},
    services::auth_service,
    state::AppState,
    web::{
        extract::AppForm,
        mw_auth::{SESSION_ROLE, SESSION_USER_ID},
    },
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    Json,
};
use tower_sessions::Session;

// GET /
pub async fn index(session: Session) -> impl IntoResponse {
    if session.get::<i64>(SESSION_USER_ID).await.ok().flatten().is_some() {
        tracing::debug!("GET /: already logged in, redirecting to /dashboard");
        return Redirect::to("/dashboard").into_response();
    }
    Json(OpResult::success("Campus Club Management. Please log in.", ())).into_response()
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    AppForm(form): AppForm<LoginForm>,
) -> AppResult<Redirect> {
    tracing::info!("Login attempt for '{}'", form.username);

    let identity = auth_service::authenticate(&state.db_pool, &form.username, &form.password).await?;

    // New id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to cycle session id: {}", e)))?;
    session
        .insert(SESSION_USER_ID, identity.user_id)
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to store user_id: {}", e)))?;
    session
        .insert(SESSION_ROLE, identity.role)
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to store role: {}", e)))?;

    tracing::info!("✅ '{}' logged in as {}", form.username, identity.role);
    Ok(Redirect::to("/dashboard"))
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let user_id: Option<i64> = session.get(SESSION_USER_ID).await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to delete session: {}", e)))?;

    match user_id {
        Some(id) => tracing::info!("🚪 User {} logged out.", id),
        None => tracing::info!("🚪 Anonymous session closed."),
    }
    Ok(Redirect::to("/"))
}
