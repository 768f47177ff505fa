// src/services/guard.rs
//! Authorization checks. Each takes the caller's identity explicitly and is
//! evaluated again on every operation; nothing is cached between calls.
use crate::{
    error::{AppError, AppResult},
    models::{
        club::CoordinatorLink,
        user::{Identity, Role},
    },
};
use sqlx::SqlitePool;

/// Requires a present identity with exactly `role`.
pub fn require_role(identity: Option<&Identity>, role: Role) -> AppResult<Identity> {
    match identity {
        Some(id) if id.role == role => Ok(*id),
        Some(id) => {
            tracing::warn!(
                "Guard: user {} has role {}, needs {}",
                id.user_id,
                id.role,
                role
            );
            Err(AppError::Unauthorized)
        }
        None => {
            tracing::debug!("Guard: anonymous request, needs {}", role);
            Err(AppError::Unauthorized)
        }
    }
}

/// Requires any present identity.
pub fn require_identity(identity: Option<&Identity>) -> AppResult<Identity> {
    identity.copied().ok_or(AppError::Unauthorized)
}

/// Looks up the club a coordinator is linked to, if any.
pub async fn find_coordinator_link(
    db_pool: &SqlitePool,
    user_id: i64,
) -> AppResult<Option<CoordinatorLink>> {
    let link = sqlx::query_as::<_, CoordinatorLink>(
        "SELECT coord_id, club_id FROM coordinators WHERE coord_id = ?1",
    )
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(link)
}

/// Requires a coordinator whose link points at `club_id`.
pub async fn require_club_coordinator(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    club_id: i64,
) -> AppResult<Identity> {
    let coordinator = require_role(identity, Role::Coordinator)?;

    match find_coordinator_link(db_pool, coordinator.user_id).await? {
        Some(link) if link.club_id == club_id => Ok(coordinator),
        Some(link) => {
            tracing::warn!(
                "Guard: coordinator {} manages club {}, not club {}",
                coordinator.user_id,
                link.club_id,
                club_id
            );
            Err(AppError::Unauthorized)
        }
        None => {
            tracing::warn!("Guard: coordinator {} is not linked to any club", coordinator.user_id);
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, services::seed_service};

    #[test]
    fn role_must_match_exactly() {
        let admin = Identity { user_id: 1, role: Role::Admin };
        assert!(require_role(Some(&admin), Role::Admin).is_ok());
        assert!(matches!(
            require_role(Some(&admin), Role::Student),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(require_role(None, Role::Admin), Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn coordinator_must_own_the_club() {
        let pool = db::create_db_pool("sqlite::memory:").await.unwrap();
        let seed = seed_service::seed(&pool, 4).await.unwrap();
        let coord = Identity { user_id: seed.coordinator_id, role: Role::Coordinator };

        assert!(require_club_coordinator(&pool, Some(&coord), seed.club_id).await.is_ok());
        assert!(matches!(
            require_club_coordinator(&pool, Some(&coord), seed.club_id + 1).await,
            Err(AppError::Unauthorized)
        ));

        // Admins do not pass coordinator checks
        let admin = Identity { user_id: seed.admin_id, role: Role::Admin };
        assert!(matches!(
            require_club_coordinator(&pool, Some(&admin), seed.club_id).await,
            Err(AppError::Unauthorized)
        ));
    }
}
