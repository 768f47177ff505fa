// src/web/mw_admin.rs
use crate::{
    error::AppError,
    models::user::{Identity, Role},
    services::guard,
};
use axum::{extract::{Extension, Request}, middleware::Next, response::Response};

/// Admin-only gate for the `/admin` routes. Runs after `require_auth`.
/// The services check the role again on their own.
pub async fn require_admin(
    Extension(identity): Extension<Identity>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard::require_role(Some(&identity), Role::Admin)?;
    tracing::debug!("Admin MW: access granted to user {}", identity.user_id);
    Ok(next.run(request).await)
}
