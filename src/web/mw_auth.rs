// src/web/mw_auth.rs
use crate::{
    error::AppError,
    models::user::{Identity, Role},
    services::user_service,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

pub const SESSION_USER_ID: &str = "user_id";
pub const SESSION_ROLE: &str = "role";

/// Resolves the session into an `Identity` request extension, or sends the
/// visitor back to the landing page.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = session
        .get::<i64>(SESSION_USER_ID)
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to read session: {}", e)))?;

    let Some(user_id) = user_id else {
        tracing::debug!("Auth MW: no user_id in session, redirecting to /");
        return Ok(Redirect::to("/").into_response());
    };

    // The account may have been deleted or changed since login
    let Some(user) = user_service::find_user_by_id(&state.db_pool, user_id).await? else {
        tracing::warn!("Auth MW: session points at missing user {}, dropping it", user_id);
        session
            .delete()
            .await
            .map_err(|e| AppError::SessionError(format!("Failed to delete session: {}", e)))?;
        return Ok(Redirect::to("/").into_response());
    };

    let session_role = session.get::<Role>(SESSION_ROLE).await.ok().flatten();
    if session_role != Some(user.role) {
        tracing::warn!(
            "Auth MW: session role {:?} for '{}' is stale, using {}",
            session_role,
            user.username,
            user.role
        );
    }

    tracing::debug!("Auth MW: '{}' ({}) authenticated", user.username, user.role);
    request.extensions_mut().insert(Identity {
        user_id: user.user_id,
        role: user.role,
    });
    Ok(next.run(request).await)
}
